//! Process-wide state containers
//!
//! Each store states its lifecycle explicitly. Only the ledger survives a
//! restart; the transcript and the draft under review are rebuilt empty.

pub mod chat;
pub mod ledger;
pub mod review;

pub use chat::ChatTranscript;
pub use ledger::LedgerStore;
pub use review::ReviewStore;

/// Lifecycle of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Reset on process restart
    Volatile,
    /// Persisted to the key-value table
    Durable,
}

/// Implemented by every store container
pub trait Store {
    const DURABILITY: Durability;

    fn durability(&self) -> Durability {
        Self::DURABILITY
    }
}
