//! Authoritative ledger entries and the approval history

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An approved item as returned by the service
///
/// Carries no client identifier; display identity is
/// `(name, purchase_date, position)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerItem {
    #[serde(rename = "item_name")]
    pub name: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub quantity: u32,
    /// Line total
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    /// As sent by the service (ISO 8601 timestamp or plain date)
    #[serde(default)]
    pub purchase_date: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Required: the approval contract always states eligibility explicitly
    pub is_eligible: bool,
}

impl LedgerItem {
    /// Purchase date, if the service sent a parseable one
    pub fn purchased_on(&self) -> Option<NaiveDate> {
        hsa_common::time::parse_date(&self.purchase_date)
    }
}

/// Lightweight summary of one approval, kept in the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub receipt_id: String,
    pub store_name: String,
    pub purchase_date: NaiveDate,
    pub payment_card: String,
    pub eligible_item_count: usize,
    pub total_eligible_cost: Decimal,
    /// Σ price × quantity over every bucket
    pub receipt_total: Decimal,
    pub approved_at: DateTime<Utc>,
}
