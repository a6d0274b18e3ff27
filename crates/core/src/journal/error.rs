//! Journal error types.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::JournalEntryId;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    // ========== Validation Errors ==========
    /// Entry has no postings.
    #[error("entry must have at least one posting")]
    NoPostings,

    /// Posting without an account key.
    #[error("posting {index}: account is required")]
    BlankAccount {
        /// Zero-based posting position.
        index: usize,
    },

    /// Posting amount is zero or negative.
    #[error("posting {index}: amount must be positive")]
    NonPositiveAmount {
        /// Zero-based posting position.
        index: usize,
    },

    /// Posting amount has more than two decimals or exceeds the money limit.
    #[error("posting {index}: amount must have at most two decimals and fit 999999999999.99")]
    InvalidAmount {
        /// Zero-based posting position.
        index: usize,
    },

    /// Debit or credit sum exceeds the largest storable amount.
    #[error("entry total exceeds the maximum amount of 999999999999.99")]
    AmountTooLarge,

    /// Debits do not equal credits.
    #[error("unbalanced entry: debit {debit} != credit {credit}")]
    Unbalanced {
        /// Debit sum.
        debit: Decimal,
        /// Credit sum.
        credit: Decimal,
    },

    /// Entry description is empty.
    #[error("description is required")]
    BlankDescription,

    /// Date range with start after end.
    #[error("start date must not be after end date")]
    InvalidDateRange,

    // ========== Lookup Errors ==========
    /// Entry not found.
    #[error("journal entry not found: {0}")]
    NotFound(JournalEntryId),

    // ========== Store Errors ==========
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl JournalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoPostings => "NO_POSTINGS",
            Self::BlankAccount { .. } => "BLANK_ACCOUNT",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::AmountTooLarge => "AMOUNT_TOO_LARGE",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::BlankDescription => "BLANK_DESCRIPTION",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::NotFound(_) => "JOURNAL_ENTRY_NOT_FOUND",
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Store(e) => e.http_status_code(),
            _ => 400,
        }
    }
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::NotFound(_) => Self::NotFound(err.to_string()),
            JournalError::Store(e) => e.into(),
            other => Self::Validation(other.to_string()),
        }
    }
}
