//! Database initialization and key-value access

pub mod init;
pub mod key_value;

pub use init::*;
pub use key_value::*;
