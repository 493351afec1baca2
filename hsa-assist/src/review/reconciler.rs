//! Approval reconciler
//!
//! Submits the draft under review and folds the authoritative reply back
//! into the ledger. The ledger is replaced, never appended to; only items
//! flagged `is_eligible` are kept.

use std::sync::Arc;

use crate::error::{AssistError, AssistResult};
use crate::models::{ApprovalRecord, LedgerItem};
use crate::services::ReceiptService;
use crate::AppState;

/// Result of a successful approval
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalOutcome {
    /// History entry appended for this receipt
    pub record: ApprovalRecord,
    /// Items now in the ledger
    pub ledger_items: usize,
    /// Items the service returned with `is_eligible` false
    pub dropped_items: usize,
}

pub struct ApprovalReconciler {
    service: Arc<dyn ReceiptService>,
}

impl ApprovalReconciler {
    pub fn new(service: Arc<dyn ReceiptService>) -> Self {
        Self { service }
    }

    /// Submit the current draft
    ///
    /// On any service failure the draft is left exactly as it was. If the
    /// ledger cannot be persisted afterwards, the in-memory ledger and draft
    /// already reflect the approval and the storage error is returned.
    pub async fn approve(&self, state: &AppState) -> AssistResult<ApprovalOutcome> {
        // Snapshot; the store lock is not held across the network call
        let draft = state
            .review
            .read()
            .await
            .current()
            .cloned()
            .ok_or(AssistError::NoActiveDraft)?;

        let payload = draft.to_approval_request();
        let returned = self.service.submit_approval(&payload).await?;

        let returned_count = returned.len();
        let eligible: Vec<LedgerItem> = returned.into_iter().filter(|i| i.is_eligible).collect();
        let dropped_items = returned_count - eligible.len();
        if dropped_items > 0 {
            tracing::debug!(dropped_items, "Ignoring non-eligible items in approval response");
        }

        let record = draft.to_history_record(hsa_common::time::now());

        let snapshot = {
            let mut ledger = state.ledger.write().await;
            ledger.set_items(eligible);
            ledger.push_history(record.clone());
            ledger.clone()
        };

        // A newer draft installed while the call was in flight stays put
        state.review.write().await.clear_if(draft.draft_id());

        tracing::info!(
            receipt_id = %record.receipt_id,
            store = %record.store_name,
            ledger_items = snapshot.items().len(),
            total_eligible_cost = %record.total_eligible_cost,
            "Receipt approved"
        );

        state.persist_ledger(&snapshot).await?;

        Ok(ApprovalOutcome {
            record,
            ledger_items: snapshot.items().len(),
            dropped_items,
        })
    }

    /// Drop the current draft without contacting the service
    pub async fn discard(&self, state: &AppState) -> bool {
        let discarded = state.review.write().await.take();
        if let Some(draft) = &discarded {
            tracing::info!(receipt_id = %draft.receipt_ref(), "Draft discarded");
        }
        discarded.is_some()
    }
}
