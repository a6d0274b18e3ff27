//! Payment error types.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{InvoiceId, PaymentId};
use thiserror::Error;

use crate::journal::JournalError;
use crate::storage::StorageError;
use crate::store::StoreError;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    // ========== Validation Errors ==========
    /// Amount is zero or negative.
    #[error("payment amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amount has more than two decimals or exceeds the money limit.
    #[error("payment amount {0} must have at most two decimals and fit 999999999999.99")]
    InvalidAmount(Decimal),

    /// Payment method missing.
    #[error("payment method is required")]
    BlankMethod,

    /// Amount is larger than what is still owed.
    #[error("amount exceeds outstanding balance of {outstanding}")]
    ExceedsOutstanding {
        /// Amount still owed before this payment.
        outstanding: Decimal,
    },

    /// Date range with start after end.
    #[error("start date must not be after end date")]
    InvalidDateRange,

    // ========== Lookup Errors ==========
    /// Invoice not found.
    #[error("invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Payment not found.
    #[error("payment not found: {0}")]
    NotFound(PaymentId),

    /// Payment has no proof file.
    #[error("payment {0} has no proof attached")]
    NoProof(PaymentId),

    // ========== Collaborator Errors ==========
    /// Journal posting failed.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Proof upload failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PaymentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) | Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::BlankMethod => "BLANK_METHOD",
            Self::ExceedsOutstanding { .. } => "EXCEEDS_OUTSTANDING",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::NotFound(_) => "PAYMENT_NOT_FOUND",
            Self::NoProof(_) => "NO_PROOF",
            Self::Journal(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NonPositiveAmount(_)
            | Self::InvalidAmount(_)
            | Self::BlankMethod
            | Self::ExceedsOutstanding { .. }
            | Self::InvalidDateRange => 400,
            Self::InvoiceNotFound(_) | Self::NotFound(_) | Self::NoProof(_) => 404,
            Self::Journal(e) => e.http_status_code(),
            Self::Storage(StorageError::Configuration(_) | StorageError::Operation(_)) => 502,
            Self::Storage(StorageError::NotFound { .. }) => 404,
            Self::Storage(_) => 400,
            Self::Store(e) => e.http_status_code(),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Journal(e) => e.into(),
            PaymentError::Storage(e) => e.into(),
            PaymentError::Store(e) => e.into(),
            PaymentError::InvoiceNotFound(_)
            | PaymentError::NotFound(_)
            | PaymentError::NoProof(_) => Self::NotFound(err.to_string()),
            PaymentError::NonPositiveAmount(_)
            | PaymentError::InvalidAmount(_)
            | PaymentError::BlankMethod
            | PaymentError::ExceedsOutstanding { .. }
            | PaymentError::InvalidDateRange => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exceeds_outstanding_is_validation() {
        let err = PaymentError::ExceedsOutstanding {
            outstanding: dec!(100.00),
        };
        assert_eq!(err.http_status_code(), 400);
        let app: AppError = err.into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");
        assert!(app.to_string().contains("exceeds outstanding balance"));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let app: AppError = PaymentError::NotFound(PaymentId::new()).into();
        assert_eq!(app.status_code(), 404);
    }
}
