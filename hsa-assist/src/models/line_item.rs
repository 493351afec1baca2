//! Line items under review
//!
//! A line item lives in exactly one of three buckets of a draft. Its
//! identifier is generated locally and only means something for the
//! duration of one review session; it never reaches the service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use uuid::Uuid;

use super::wire::WireItem;

/// Largest unit price magnitude a draft accepts
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Largest quantity a draft accepts
pub const MAX_QUANTITY: u32 = 1_000_000;

/// Review-session-local identifier of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemId(Uuid);

impl LineItemId {
    pub fn new() -> Self {
        Self(hsa_common::uuid_utils::generate())
    }
}

impl Default for LineItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Classification bucket of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// Reimbursement-eligible
    Eligible,
    /// Not reimbursement-eligible
    NonEligible,
    /// Classifier could not decide; needs a user decision
    Unsure,
}

impl Eligibility {
    pub const ALL: [Eligibility; 3] = [
        Eligibility::Eligible,
        Eligibility::NonEligible,
        Eligibility::Unsure,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Eligibility::Eligible => "eligible",
            Eligibility::NonEligible => "non-eligible",
            Eligibility::Unsure => "unsure",
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One line of a receipt under review
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: LineItemId,
    pub name: String,
    pub price: Decimal,
    /// Always at least 1
    pub quantity: u32,
    pub description: String,
    pub eligibility: Eligibility,
}

impl LineItem {
    pub fn new(
        name: impl Into<String>,
        price: Decimal,
        quantity: u32,
        description: impl Into<String>,
        eligibility: Eligibility,
    ) -> Self {
        Self {
            id: LineItemId::new(),
            name: name.into(),
            price,
            quantity: quantity.max(1),
            description: description.into(),
            eligibility,
        }
    }

    /// Build from the service representation, assigning a fresh identifier
    pub fn from_wire(item: WireItem, eligibility: Eligibility) -> Self {
        Self::new(item.name, item.price, item.quantity, item.description, eligibility)
    }

    /// Strip the session-local fields for the approval contract
    pub fn to_wire(&self) -> WireItem {
        WireItem {
            name: self.name.clone(),
            price: self.price,
            quantity: self.quantity,
            description: self.description.clone(),
        }
    }

    /// price × quantity, saturating at the `Decimal` range
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Whether price and quantity lie inside the accepted range
    pub fn amounts_in_range(price: Decimal, quantity: u32) -> bool {
        price.abs() <= MAX_UNIT_PRICE && quantity <= MAX_QUANTITY
    }
}

/// Partial update of a line item's editable fields
///
/// Identifier and eligibility are deliberately absent: bucket membership
/// only changes through the move operations of the draft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<NonZeroU32>,
    pub description: Option<String>,
}

impl ItemPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn quantity(mut self, quantity: NonZeroU32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.description.is_none()
    }

    /// Merge the patch over `item`
    pub fn apply(&self, item: &mut LineItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity.get();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
    }
}
