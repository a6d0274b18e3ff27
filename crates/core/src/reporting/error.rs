//! Reporting error types.

use tally_shared::AppError;
use thiserror::Error;

use crate::journal::JournalError;
use crate::render::RenderError;
use crate::store::StoreError;

/// Errors that can occur while building reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Start date after end date.
    #[error("start date must not be after end date")]
    InvalidDateRange,

    /// Range too long for a per-day series.
    #[error("date range spans {days} days, at most {max} are allowed")]
    RangeTooLong {
        /// Requested span.
        days: i64,
        /// Allowed span.
        max: i64,
    },

    /// Unknown period name.
    #[error("unknown period '{0}', expected month, quarter or year")]
    UnknownPeriod(String),

    /// Unknown sales grouping.
    #[error("unknown grouping '{0}', expected product, client or date")]
    UnknownGrouping(String),

    /// Unknown export name.
    #[error("unknown export '{0}'")]
    UnknownExport(String),

    /// No invoices for that customer.
    #[error("no invoices found for customer {0}")]
    CustomerNotFound(String),

    /// Journal aggregation failed.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Export rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::RangeTooLong { .. } => "RANGE_TOO_LONG",
            Self::UnknownPeriod(_) => "UNKNOWN_PERIOD",
            Self::UnknownGrouping(_) => "UNKNOWN_GROUPING",
            Self::UnknownExport(_) => "UNKNOWN_EXPORT",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::Journal(e) => e.error_code(),
            Self::Render(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidDateRange
            | Self::RangeTooLong { .. }
            | Self::UnknownPeriod(_)
            | Self::UnknownGrouping(_)
            | Self::UnknownExport(_) => 400,
            Self::CustomerNotFound(_) => 404,
            Self::Journal(e) => e.http_status_code(),
            Self::Render(e) => e.http_status_code(),
            Self::Store(e) => e.http_status_code(),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Journal(e) => e.into(),
            ReportError::Render(e) => e.into(),
            ReportError::Store(e) => e.into(),
            ReportError::CustomerNotFound(_) => Self::NotFound(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}
