//! Quote lifecycle.
//!
//! A quote is a priced proposal for a prospective customer. It starts
//! `pending`, may be `approved` or `rejected`, and becomes `invoiced` only
//! when an invoice is derived from it. Invoiced quotes are frozen.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::QuoteError;
pub use service::QuoteService;
pub use types::{
    Customer, NewQuote, Quote, QuoteDeletion, QuoteFilter, QuotePatch, QuoteStats, QuoteStatus,
};
