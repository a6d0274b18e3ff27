//! Line items and computed totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default flat tax rate (7%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);

/// One priced line of a quote or invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// What is being sold.
    pub description: String,
    /// Price of a single unit.
    pub unit_price: Decimal,
    /// Number of units.
    pub quantity: i32,
}

impl LineItem {
    /// Creates a line item.
    #[must_use]
    pub fn new(description: impl Into<String>, unit_price: Decimal, quantity: i32) -> Self {
        Self {
            description: description.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns `unit_price × quantity`, saturating at the `Decimal` bounds.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Returns `unit_price × quantity`, or `None` on overflow.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Result of pricing a list of line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of line totals.
    pub subtotal: Decimal,
    /// Tax on the subtotal.
    pub tax: Decimal,
    /// `subtotal + tax`.
    pub total: Decimal,
}
