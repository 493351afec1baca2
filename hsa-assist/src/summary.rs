//! Expense summary over the ledger and approval history

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::models::{ApprovalRecord, LedgerItem};
use crate::stores::LedgerStore;

/// Totals over the approval history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStatistics {
    pub total_amount: Decimal,
    /// Receipts purchased since the first of `today`'s month
    pub monthly_amount: Decimal,
    pub receipt_count: usize,
    pub item_count: usize,
}

impl HistoryStatistics {
    pub fn compute(history: &[ApprovalRecord], today: NaiveDate) -> Self {
        let month_start = today.with_day(1).unwrap_or(today);

        history.iter().fold(Self::default(), |mut stats, record| {
            stats.total_amount = stats.total_amount.saturating_add(record.total_eligible_cost);
            if record.purchase_date >= month_start {
                stats.monthly_amount =
                    stats.monthly_amount.saturating_add(record.total_eligible_cost);
            }
            stats.receipt_count += 1;
            stats.item_count += record.eligible_item_count;
            stats
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    Price,
    Store,
    Name,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "price" | "amount" => Ok(SortKey::Price),
            "store" | "store_name" => Ok(SortKey::Store),
            "name" => Ok(SortKey::Name),
            other => Err(format!("unknown sort key '{}' (date, price, store, name)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Filter and ordering for the ledger view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    /// Exact store name
    pub store: Option<String>,
    /// Case-insensitive match on item name or description
    pub search: Option<String>,
    /// Inclusive
    pub from: Option<NaiveDate>,
    /// Inclusive
    pub to: Option<NaiveDate>,
    pub sort_by: SortKey,
    pub order: SortOrder,
}

/// One row of the ledger view
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow<'a> {
    /// Position in the stored ledger; with name and date, the row identity
    pub position: usize,
    pub purchase_date: Option<NaiveDate>,
    pub item: &'a LedgerItem,
}

impl LedgerRow<'_> {
    /// Display identity `(name, purchase_date, position)`
    pub fn key(&self) -> String {
        let date = self
            .purchase_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        format!("{}-{}-{}", self.item.name, date, self.position)
    }
}

/// Filtered, ordered slice of the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerView<'a> {
    pub rows: Vec<LedgerRow<'a>>,
    /// Σ price over the rows; ledger prices are line totals
    pub total_cost: Decimal,
}

impl LedgerFilter {
    pub fn matches(&self, item: &LedgerItem, purchase_date: Option<NaiveDate>) -> bool {
        if let Some(store) = &self.store {
            if &item.store_name != store {
                return false;
            }
        }

        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = item.name.to_lowercase().contains(&term)
                || item.description.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }

        if self.from.is_some() || self.to.is_some() {
            let Some(date) = purchase_date else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }

        true
    }

    pub fn apply<'a>(&self, items: &'a [LedgerItem]) -> LedgerView<'a> {
        let mut rows: Vec<LedgerRow<'a>> = items
            .iter()
            .enumerate()
            .map(|(position, item)| LedgerRow {
                position,
                purchase_date: item.purchased_on(),
                item,
            })
            .filter(|row| self.matches(row.item, row.purchase_date))
            .collect();

        // Stable sort: ties keep ledger order
        rows.sort_by(|a, b| {
            let ordering = self.compare(a, b);
            match self.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });

        // Ledger prices come straight from the service
        let total_cost = rows
            .iter()
            .fold(Decimal::ZERO, |acc, row| acc.saturating_add(row.item.price));
        LedgerView { rows, total_cost }
    }

    fn compare(&self, a: &LedgerRow<'_>, b: &LedgerRow<'_>) -> Ordering {
        match self.sort_by {
            // Undated rows sort as the oldest
            SortKey::Date => a.purchase_date.cmp(&b.purchase_date),
            SortKey::Price => a.item.price.cmp(&b.item.price),
            SortKey::Store => a.item.store_name.cmp(&b.item.store_name),
            SortKey::Name => a.item.name.cmp(&b.item.name),
        }
    }
}

/// Statistics plus the default ledger view
pub fn summarize<'a>(
    ledger: &'a LedgerStore,
    filter: &LedgerFilter,
    today: NaiveDate,
) -> (HistoryStatistics, LedgerView<'a>) {
    (
        HistoryStatistics::compute(ledger.history(), today),
        filter.apply(ledger.items()),
    )
}
