//! Wire contract of the remote classification/approval service
//!
//! JSON bodies with files inlined as base64. Classification goes to
//! `POST /chat`, approval to `POST /review`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ledger::LedgerItem;

/// Inline file payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    /// Base64 without the `data:` URL prefix
    pub serialized_image: String,
    pub mime_type: String,
}

/// `POST /chat` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub text: String,
    pub files: Vec<ImageData>,
    pub session_id: String,
    pub user_id: String,
}

/// Line item as the service sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireItem {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub description: String,
}

/// Review payload carried by a classification response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub receipt_id: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub hsa_eligible_items: Vec<WireItem>,
    #[serde(default)]
    pub non_hsa_eligible_items: Vec<WireItem>,
    #[serde(default)]
    pub unsure_hsa_items: Vec<WireItem>,
    #[serde(default)]
    pub payment_card: String,
    #[serde(default)]
    pub card_last_four_digit: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
}

/// `POST /chat` response body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Display text; always present
    pub response: String,
    /// Present only when a receipt was recognized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_request: Option<ReviewRequest>,
    #[serde(default)]
    pub thinking_process: Option<String>,
    #[serde(default)]
    pub attachments: Vec<ImageData>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// `POST /review` request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub receipt_id: String,
    pub store_name: String,
    /// ISO 8601, midnight UTC of the purchase date
    pub date: String,
    pub approved_hsa_eligible_items: Vec<WireItem>,
    pub approved_non_hsa_eligible_items: Vec<WireItem>,
    pub approved_unsure_hsa_items: Vec<WireItem>,
    pub payment_card: String,
    pub card_last_four_digit: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
}

/// `POST /review` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveResponse {
    #[serde(default)]
    pub items: Vec<LedgerItem>,
}
