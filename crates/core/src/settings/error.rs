//! Settings error types.

use rust_decimal::Decimal;
use tally_shared::AppError;
use thiserror::Error;

use crate::storage::StorageError;
use crate::store::StoreError;

/// Errors that can occur while reading or changing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Tax rate outside `[0, 1]`.
    #[error("tax rate {0} must be between 0 and 1")]
    InvalidTaxRate(Decimal),

    /// Quote validity of zero days.
    #[error("quote validity must be at least one day")]
    InvalidValidity,

    /// Company name missing.
    #[error("company name is required")]
    BlankCompanyName,

    /// Asset upload failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SettingsError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTaxRate(_) => "INVALID_TAX_RATE",
            Self::InvalidValidity => "INVALID_VALIDITY",
            Self::BlankCompanyName => "BLANK_COMPANY_NAME",
            Self::Storage(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Storage(e) => e.into(),
            SettingsError::Store(e) => e.into(),
            other => Self::Validation(other.to_string()),
        }
    }
}
