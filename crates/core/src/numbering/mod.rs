//! Document numbering authority.
//!
//! Quotes and invoices carry human-readable numbers of the form
//! `<PREFIX>-<year>-<seq4>`. Sequences are per document kind and per year and
//! are allocated from an atomically incremented counter in the store, so two
//! concurrent requests can never receive the same number.

pub mod service;
pub mod types;

#[cfg(test)]
mod props;

pub use service::NumberingAuthority;
pub use types::{DocumentKind, DocumentNumber, ParseDocumentNumberError};
