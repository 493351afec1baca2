//! # HSA Common Library
//!
//! Shared code for the HSA expense assistant crates:
//! - Common error type
//! - Bootstrap configuration loading and root folder resolution
//! - SQLite initialization and the key-value store table
//! - Time and identifier helpers

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
