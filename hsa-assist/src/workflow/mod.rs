//! User-facing workflows

pub mod assistant;

pub use assistant::{Assistant, ChatOutcome, SessionIdentity};
