//! Receipt review: the draft engine and the approval reconciler

pub mod draft;
pub mod reconciler;

pub use draft::{sanitize_last_four, DraftError, ReceiptDraft, ReceiptField};
pub use reconciler::{ApprovalOutcome, ApprovalReconciler};
