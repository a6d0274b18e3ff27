//! Calculation errors.

use rust_decimal::Decimal;
use tally_shared::AppError;
use thiserror::Error;

/// Errors raised while pricing line items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// No line items were supplied.
    #[error("at least one line item is required")]
    NoItems,

    /// A line item has an empty description.
    #[error("item {index}: description is required")]
    BlankDescription {
        /// Zero-based position of the item.
        index: usize,
    },

    /// A line item has a quantity of zero or less.
    #[error("item {index}: quantity must be greater than zero")]
    NonPositiveQuantity {
        /// Zero-based position of the item.
        index: usize,
    },

    /// A line item has a negative unit price.
    #[error("item {index}: unit price cannot be negative")]
    NegativePrice {
        /// Zero-based position of the item.
        index: usize,
    },

    /// A unit price with more than two decimals or beyond the money column.
    #[error("item {index}: unit price must have at most two decimals and fit 999999999999.99")]
    InvalidPrice {
        /// Zero-based position of the item.
        index: usize,
    },

    /// Subtotal or total exceeds the largest storable amount.
    #[error("total exceeds the maximum amount of 999999999999.99")]
    AmountTooLarge,

    /// Tax rate outside `[0, 1]`.
    #[error("tax rate {0} must be between 0 and 1")]
    InvalidTaxRate(Decimal),
}

impl BillingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoItems => "NO_ITEMS",
            Self::BlankDescription { .. } => "BLANK_DESCRIPTION",
            Self::NonPositiveQuantity { .. } => "INVALID_QUANTITY",
            Self::NegativePrice { .. } => "NEGATIVE_PRICE",
            Self::InvalidPrice { .. } => "INVALID_PRICE",
            Self::AmountTooLarge => "AMOUNT_TOO_LARGE",
            Self::InvalidTaxRate(_) => "INVALID_TAX_RATE",
        }
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        Self::Validation(err.to_string())
    }
}
