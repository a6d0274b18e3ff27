//! Invoice error types.

use tally_shared::AppError;
use tally_shared::types::{InvoiceId, QuoteId};
use thiserror::Error;

use crate::quote::QuoteStatus;
use crate::store::StoreError;

/// Errors that can occur during invoice operations.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Invoice not found.
    #[error("invoice not found: {0}")]
    NotFound(InvoiceId),

    /// Source quote not found.
    #[error("quote not found: {0}")]
    QuoteNotFound(QuoteId),

    /// Source quote is not approved.
    #[error("quote {quote_id} is {status}, only approved quotes can be invoiced")]
    QuoteNotApproved {
        /// Source quote.
        quote_id: QuoteId,
        /// Its status at conversion time.
        status: QuoteStatus,
    },

    /// Date range with start after end.
    #[error("start date must not be after end date")]
    InvalidDateRange,

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl InvoiceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "INVOICE_NOT_FOUND",
            Self::QuoteNotFound(_) => "QUOTE_NOT_FOUND",
            Self::QuoteNotApproved { .. } => "QUOTE_NOT_APPROVED",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::QuoteNotFound(_) => 404,
            Self::QuoteNotApproved { .. } => 409,
            Self::InvalidDateRange => 400,
            Self::Store(e) => e.http_status_code(),
        }
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::Store(e) => e.into(),
            InvoiceError::NotFound(_) | InvoiceError::QuoteNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            InvoiceError::QuoteNotApproved { .. } => Self::InvalidState(err.to_string()),
            InvoiceError::InvalidDateRange => Self::Validation(err.to_string()),
        }
    }
}
