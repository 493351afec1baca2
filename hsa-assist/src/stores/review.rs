//! Receipt under review (volatile)

use uuid::Uuid;

use super::{Durability, Store};
use crate::review::ReceiptDraft;

/// Holds at most one draft at a time
#[derive(Debug, Clone, Default)]
pub struct ReviewStore {
    current: Option<ReceiptDraft>,
}

impl Store for ReviewStore {
    const DURABILITY: Durability = Durability::Volatile;
}

impl ReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `draft`, replacing any previous one
    pub fn set_current(&mut self, draft: ReceiptDraft) -> Option<ReceiptDraft> {
        if let Some(previous) = &self.current {
            tracing::debug!(
                receipt_id = %previous.receipt_ref(),
                "Replacing draft under review"
            );
        }
        self.current.replace(draft)
    }

    pub fn current(&self) -> Option<&ReceiptDraft> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut ReceiptDraft> {
        self.current.as_mut()
    }

    pub fn has_draft(&self) -> bool {
        self.current.is_some()
    }

    pub fn take(&mut self) -> Option<ReceiptDraft> {
        self.current.take()
    }

    /// Clear the draft only if it is still the instance `draft_id`
    pub fn clear_if(&mut self, draft_id: Uuid) -> bool {
        let matches = self
            .current
            .as_ref()
            .is_some_and(|d| d.draft_id() == draft_id);
        if matches {
            self.current = None;
        }
        matches
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
