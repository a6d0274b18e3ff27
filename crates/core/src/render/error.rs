//! Rendering error types.

use tally_shared::AppError;
use thiserror::Error;

/// Errors raised while producing documents.
#[derive(Debug, Error)]
pub enum RenderError {
    /// PDF generation failed.
    #[error("pdf rendering failed: {0}")]
    Pdf(String),

    /// CSV writing failed.
    #[error("csv rendering failed: {0}")]
    Csv(String),
}

impl RenderError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Pdf(_) => "PDF_RENDER_FAILED",
            Self::Csv(_) => "CSV_RENDER_FAILED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        502
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        Self::ExternalService(err.to_string())
    }
}

impl From<csv::Error> for RenderError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}
