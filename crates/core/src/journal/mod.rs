//! Double-entry accounting journal.
//!
//! This module implements:
//! - Journal entries made of debit and credit postings
//! - Balance validation at posting and at confirmation
//! - Balance sheet, income statement and cash-flow aggregation
//! - Accounts-receivable aging buckets
//! - Per-account movement listings

pub mod accounts;
pub mod aging;
pub mod error;
pub mod service;
pub mod statements;
pub mod types;
pub mod validation;

#[cfg(test)]
mod statements_tests;
#[cfg(test)]
mod validation_props;

pub use aging::{AgingBucket, AgingBucketTotal, AgingReport, aging_bucket_for_days};
pub use error::JournalError;
pub use service::Journal;
pub use statements::{
    AccountBalance, AccountMovement, BalanceSheet, CashFlowLine, CashFlowStatement,
    IncomeStatement, IncomeStatementLine,
};
pub use types::{
    EntryDraft, EntryKind, EntryState, JournalEntry, JournalFilter, Posting, PostingCategory, Side,
};
pub use validation::{PostingTotals, validate_postings};
