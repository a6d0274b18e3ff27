//! Money and line-item calculation.
//!
//! This module implements the pricing arithmetic shared by quotes and invoices:
//! - Line items (description, unit price, quantity)
//! - Subtotal, flat-rate tax and total
//! - Input validation at the boundary

pub mod calculator;
pub mod error;
pub mod types;

#[cfg(test)]
mod calculator_props;

pub use calculator::{
    MAX_MONEY, MONEY_SCALE, average, compute_totals, is_money_amount, percentage, round_money,
    validate_items,
};
pub use error::BillingError;
pub use types::{DEFAULT_TAX_RATE, LineItem, Totals};
