//! Item classification engine
//!
//! A [`ReceiptDraft`] owns one receipt for the duration of a review session:
//! three ordered, disjoint buckets of line items plus receipt metadata.
//!
//! Transitions per line item:
//!
//! ```text
//! Eligible <──> NonEligible
//!     ^             ^
//!      \           /
//!        Unsure ──┘        (one way; nothing re-enters Unsure)
//!
//! any bucket ──> removed
//! ```
//!
//! `total_eligible_cost` is derived: it is recomputed whenever the Eligible
//! bucket changes and cannot be set directly. Prices and quantities are kept
//! inside [`MAX_UNIT_PRICE`] and [`MAX_QUANTITY`] so the totals stay exact.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::line_item::{MAX_QUANTITY, MAX_UNIT_PRICE};
use crate::models::{
    ApprovalRecord, ApproveRequest, Eligibility, ItemPatch, LineItem, LineItemId, ReviewRequest,
};

/// Rejected draft operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Cannot move an item from {from} to {to}")]
    InvalidTransition { from: Eligibility, to: Eligibility },

    #[error("Item {id} is not in the {bucket} list")]
    ItemNotFound { id: LineItemId, bucket: Eligibility },

    #[error("{name}: price {price} x quantity {quantity} is out of range")]
    AmountOutOfRange {
        name: String,
        price: Decimal,
        quantity: u32,
    },
}

fn check_amounts(name: &str, price: Decimal, quantity: u32) -> Result<(), DraftError> {
    if LineItem::amounts_in_range(price, quantity) {
        Ok(())
    } else {
        Err(DraftError::AmountOutOfRange {
            name: name.to_string(),
            price,
            quantity,
        })
    }
}

/// Editable receipt-level field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptField {
    StoreName(String),
    PurchaseDate(NaiveDate),
    PaymentLabel(String),
    /// Non-digits are dropped and the result cut to 4 characters
    LastFour(String),
}

/// Digits only, at most four of them
pub fn sanitize_last_four(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).take(4).collect()
}

/// In-progress classification of one receipt
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDraft {
    /// Assigned locally; unlike `receipt_ref` it is never empty or shared
    draft_id: Uuid,
    receipt_ref: String,
    store_name: String,
    purchase_date: NaiveDate,
    payment_label: String,
    last_four: String,
    eligible: Vec<LineItem>,
    non_eligible: Vec<LineItem>,
    unsure: Vec<LineItem>,
    total_eligible_cost: Decimal,
    /// Total reported by the classifier, kept for display only
    reported_total: Decimal,
    image_ref: Option<String>,
}

impl ReceiptDraft {
    /// Empty draft with the given metadata
    pub fn new(
        receipt_ref: impl Into<String>,
        store_name: impl Into<String>,
        purchase_date: NaiveDate,
        payment_label: impl Into<String>,
        last_four: &str,
    ) -> Self {
        Self {
            draft_id: hsa_common::uuid_utils::generate(),
            receipt_ref: receipt_ref.into(),
            store_name: store_name.into(),
            purchase_date,
            payment_label: payment_label.into(),
            last_four: sanitize_last_four(last_four),
            eligible: Vec::new(),
            non_eligible: Vec::new(),
            unsure: Vec::new(),
            total_eligible_cost: Decimal::ZERO,
            reported_total: Decimal::ZERO,
            image_ref: None,
        }
    }

    /// Build a draft from a classification response
    ///
    /// Every item gets a fresh identifier. A date the service sent in an
    /// unrecognized format falls back to today. An item whose price or
    /// quantity is out of range rejects the whole response.
    pub fn from_review(
        review: ReviewRequest,
        image_ref: Option<String>,
    ) -> Result<Self, DraftError> {
        let purchase_date = hsa_common::time::parse_date(&review.date).unwrap_or_else(|| {
            tracing::warn!(date = %review.date, "Unrecognized receipt date, using today");
            hsa_common::time::today()
        });

        let mut draft = Self::new(
            review.receipt_id,
            review.store_name,
            purchase_date,
            review.payment_card,
            &review.card_last_four_digit,
        );
        draft.reported_total = review.total_cost;
        draft.image_ref = image_ref.filter(|url| !url.trim().is_empty());

        for (bucket, items) in [
            (Eligibility::Eligible, review.hsa_eligible_items),
            (Eligibility::NonEligible, review.non_hsa_eligible_items),
            (Eligibility::Unsure, review.unsure_hsa_items),
        ] {
            for item in items {
                check_amounts(&item.name, item.price, item.quantity)?;
                draft.bucket_mut(bucket).push(LineItem::from_wire(item, bucket));
            }
        }
        draft.recompute_total();

        tracing::debug!(
            receipt_id = %draft.receipt_ref,
            eligible = draft.eligible.len(),
            non_eligible = draft.non_eligible.len(),
            unsure = draft.unsure.len(),
            "Draft created from classification"
        );

        Ok(draft)
    }

    /// Append a new item to `bucket`; returns its identifier
    pub fn add_item(
        &mut self,
        bucket: Eligibility,
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
        description: impl Into<String>,
    ) -> Result<LineItemId, DraftError> {
        let item = LineItem::new(name, price, quantity, description, bucket);
        check_amounts(&item.name, item.price, item.quantity)?;
        let id = item.id;
        self.bucket_mut(bucket).push(item);
        self.after_change(bucket);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Identity of this draft instance
    pub fn draft_id(&self) -> Uuid {
        self.draft_id
    }

    pub fn receipt_ref(&self) -> &str {
        &self.receipt_ref
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn purchase_date(&self) -> NaiveDate {
        self.purchase_date
    }

    pub fn payment_label(&self) -> &str {
        &self.payment_label
    }

    pub fn last_four(&self) -> &str {
        &self.last_four
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }

    pub fn reported_total(&self) -> Decimal {
        self.reported_total
    }

    /// Σ price × quantity over the Eligible bucket
    pub fn total_eligible_cost(&self) -> Decimal {
        self.total_eligible_cost
    }

    /// Σ price × quantity over every bucket
    pub fn receipt_total(&self) -> Decimal {
        sum_line_totals(Eligibility::ALL.iter().flat_map(|b| self.items(*b)))
    }

    pub fn items(&self, bucket: Eligibility) -> &[LineItem] {
        match bucket {
            Eligibility::Eligible => &self.eligible,
            Eligibility::NonEligible => &self.non_eligible,
            Eligibility::Unsure => &self.unsure,
        }
    }

    pub fn item_count(&self) -> usize {
        self.eligible.len() + self.non_eligible.len() + self.unsure.len()
    }

    /// Locate an item in whichever bucket holds it
    pub fn find(&self, id: LineItemId) -> Option<(Eligibility, &LineItem)> {
        Eligibility::ALL.iter().find_map(|bucket| {
            self.items(*bucket)
                .iter()
                .find(|item| item.id == id)
                .map(|item| (*bucket, item))
        })
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Merge `patch` over the item `id` in `bucket`
    ///
    /// A missing item is a silent no-op; the return value tells whether
    /// anything was updated. A patch that would put the amounts out of range
    /// leaves the item untouched.
    pub fn update_item(
        &mut self,
        bucket: Eligibility,
        id: LineItemId,
        patch: &ItemPatch,
    ) -> Result<bool, DraftError> {
        let Some(item) = self.bucket_mut(bucket).iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        let price = patch.price.unwrap_or(item.price);
        let quantity = patch.quantity.map_or(item.quantity, |q| q.get());
        check_amounts(patch.name.as_deref().unwrap_or(&item.name), price, quantity)?;

        patch.apply(item);
        self.after_change(bucket);
        Ok(true)
    }

    /// Remove the item `id` from `bucket`
    pub fn delete_item(&mut self, bucket: Eligibility, id: LineItemId) -> Option<LineItem> {
        let removed = take_item(self.bucket_mut(bucket), id)?;
        self.after_change(bucket);
        Some(removed)
    }

    /// Toggle an item between Eligible and NonEligible
    pub fn move_item(
        &mut self,
        id: LineItemId,
        from: Eligibility,
        to: Eligibility,
    ) -> Result<(), DraftError> {
        let valid = matches!(
            (from, to),
            (Eligibility::Eligible, Eligibility::NonEligible)
                | (Eligibility::NonEligible, Eligibility::Eligible)
        );
        if !valid {
            return Err(DraftError::InvalidTransition { from, to });
        }
        self.transfer(id, from, to)
    }

    /// Settle an Unsure item as Eligible or NonEligible
    pub fn resolve_unsure(&mut self, id: LineItemId, to: Eligibility) -> Result<(), DraftError> {
        if to == Eligibility::Unsure {
            return Err(DraftError::InvalidTransition {
                from: Eligibility::Unsure,
                to,
            });
        }
        self.transfer(id, Eligibility::Unsure, to)
    }

    pub fn update_receipt_field(&mut self, field: ReceiptField) {
        match field {
            ReceiptField::StoreName(name) => self.store_name = name,
            ReceiptField::PurchaseDate(date) => self.purchase_date = date,
            ReceiptField::PaymentLabel(label) => self.payment_label = label,
            ReceiptField::LastFour(raw) => self.last_four = sanitize_last_four(&raw),
        }
    }

    // ------------------------------------------------------------------
    // Approval contract
    // ------------------------------------------------------------------

    /// Wire form for `POST /review`; identifiers and eligibility are dropped,
    /// the bucket an item sits in carries its classification.
    pub fn to_approval_request(&self) -> ApproveRequest {
        let wire = |bucket: Eligibility| self.items(bucket).iter().map(LineItem::to_wire).collect();

        ApproveRequest {
            receipt_id: self.receipt_ref.clone(),
            store_name: self.store_name.clone(),
            date: hsa_common::time::date_to_iso8601(self.purchase_date),
            approved_hsa_eligible_items: wire(Eligibility::Eligible),
            approved_non_hsa_eligible_items: wire(Eligibility::NonEligible),
            approved_unsure_hsa_items: wire(Eligibility::Unsure),
            payment_card: self.payment_label.clone(),
            card_last_four_digit: self.last_four.clone(),
            total_cost: self.total_eligible_cost,
        }
    }

    /// History entry describing this draft at approval time
    pub fn to_history_record(&self, approved_at: chrono::DateTime<chrono::Utc>) -> ApprovalRecord {
        ApprovalRecord {
            receipt_id: self.receipt_ref.clone(),
            store_name: self.store_name.clone(),
            purchase_date: self.purchase_date,
            payment_card: self.payment_label.clone(),
            eligible_item_count: self.eligible.len(),
            total_eligible_cost: self.total_eligible_cost,
            receipt_total: self.receipt_total(),
            approved_at,
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn bucket_mut(&mut self, bucket: Eligibility) -> &mut Vec<LineItem> {
        match bucket {
            Eligibility::Eligible => &mut self.eligible,
            Eligibility::NonEligible => &mut self.non_eligible,
            Eligibility::Unsure => &mut self.unsure,
        }
    }

    fn transfer(
        &mut self,
        id: LineItemId,
        from: Eligibility,
        to: Eligibility,
    ) -> Result<(), DraftError> {
        let mut item = take_item(self.bucket_mut(from), id)
            .ok_or(DraftError::ItemNotFound { id, bucket: from })?;
        item.eligibility = to;

        tracing::debug!(item = %item.name, %from, %to, "Moved line item");

        self.bucket_mut(to).push(item);
        self.after_change(from);
        self.after_change(to);
        Ok(())
    }

    fn after_change(&mut self, bucket: Eligibility) {
        if bucket == Eligibility::Eligible {
            self.recompute_total();
        }
    }

    fn recompute_total(&mut self) {
        self.total_eligible_cost = sum_line_totals(&self.eligible);
    }
}

fn sum_line_totals<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> Decimal {
    items
        .into_iter()
        .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.line_total()))
}

fn take_item(items: &mut Vec<LineItem>, id: LineItemId) -> Option<LineItem> {
    let index = items.iter().position(|i| i.id == id)?;
    Some(items.remove(index))
}
