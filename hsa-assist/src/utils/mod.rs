//! Utility modules for hsa-assist

pub mod retry;

pub use retry::{retry_with_delay, RetryPolicy};
