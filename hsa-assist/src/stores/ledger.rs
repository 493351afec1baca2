//! Authoritative ledger and approval history (durable)
//!
//! Serialized as a single JSON document; see [`crate::db::LedgerRepository`].

use serde::{Deserialize, Serialize};

use super::{Durability, Store};
use crate::models::{ApprovalRecord, LedgerItem};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerStore {
    #[serde(default)]
    items: Vec<LedgerItem>,
    #[serde(default)]
    history: Vec<ApprovalRecord>,
}

impl Store for LedgerStore {
    const DURABILITY: Durability = Durability::Durable;
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[LedgerItem] {
        &self.items
    }

    pub fn history(&self) -> &[ApprovalRecord] {
        &self.history
    }

    /// Replace the ledger contents wholesale
    pub fn set_items(&mut self, items: Vec<LedgerItem>) {
        tracing::debug!(previous = self.items.len(), new = items.len(), "Replacing ledger items");
        self.items = items;
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    pub fn push_history(&mut self, record: ApprovalRecord) {
        self.history.push(record);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
