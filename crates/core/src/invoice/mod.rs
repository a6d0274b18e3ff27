//! Invoice lifecycle.
//!
//! An invoice is derived exactly once from an approved quote and keeps a
//! frozen snapshot of its customer, items and totals. Its payment status is
//! derived from the sum of confirmed payments:
//! - nothing confirmed: `pending`
//! - some confirmed: `partially_paid`
//! - total reached: `paid`

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::InvoiceError;
pub use service::InvoiceService;
pub use types::{Invoice, InvoiceFilter, InvoiceStats, InvoiceStatus, QuoteConversion};
