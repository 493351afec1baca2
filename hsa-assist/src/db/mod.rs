//! Durable state persistence

pub mod ledger;

pub use ledger::{LedgerRepository, LEDGER_STORE_KEY};
