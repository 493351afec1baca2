//! Data models for receipt review, the ledger and the chat transcript

pub mod ledger;
pub mod line_item;
pub mod message;
pub mod wire;

pub use ledger::{ApprovalRecord, LedgerItem};
pub use line_item::{Eligibility, ItemPatch, LineItem, LineItemId};
pub use message::{ChatMessage, MessageAttachment, MessageId, Role};
pub use wire::{
    ApproveRequest, ApproveResponse, ChatRequest, ChatResponse, ImageData, ReviewRequest, WireItem,
};
