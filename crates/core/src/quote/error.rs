//! Quote error types.

use tally_shared::AppError;
use tally_shared::types::QuoteId;
use thiserror::Error;

use super::types::QuoteStatus;
use crate::billing::BillingError;
use crate::settings::SettingsError;
use crate::store::StoreError;

/// Errors that can occur during quote operations.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Customer block is incomplete or malformed.
    #[error("invalid customer: {0}")]
    InvalidCustomer(String),

    /// Line items failed validation.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// No quote with that id.
    #[error("quote not found: {0}")]
    NotFound(QuoteId),

    /// Requested status change is not a legal manual transition.
    #[error("cannot move quote from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: QuoteStatus,
        /// Requested status.
        to: QuoteStatus,
    },

    /// The quote is invoiced and can no longer change.
    #[error("quote {0} is invoiced and cannot be modified")]
    Invoiced(QuoteId),

    /// The quote changed while the update was being prepared.
    #[error("quote {0} was modified concurrently")]
    Conflict(QuoteId),

    /// Search text was blank.
    #[error("search text is required")]
    BlankSearch,

    /// Settings lookup failed.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QuoteError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCustomer(_) => "INVALID_CUSTOMER",
            Self::Billing(e) => e.error_code(),
            Self::NotFound(_) => "QUOTE_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Invoiced(_) => "QUOTE_INVOICED",
            Self::Conflict(_) => "CONCURRENT_MODIFICATION",
            Self::BlankSearch => "BLANK_SEARCH",
            Self::Settings(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidCustomer(_) | Self::Billing(_) | Self::BlankSearch => 400,
            Self::NotFound(_) => 404,
            Self::InvalidTransition { .. } | Self::Invoiced(_) | Self::Conflict(_) => 409,
            Self::Settings(_) | Self::Store(_) => 500,
        }
    }
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::Billing(e) => e.into(),
            QuoteError::Settings(e) => e.into(),
            QuoteError::Store(e) => e.into(),
            QuoteError::NotFound(_) => Self::NotFound(err.to_string()),
            QuoteError::InvalidTransition { .. }
            | QuoteError::Invoiced(_)
            | QuoteError::Conflict(_) => Self::InvalidState(err.to_string()),
            QuoteError::InvalidCustomer(_) | QuoteError::BlankSearch => {
                Self::Validation(err.to_string())
            }
        }
    }
}
