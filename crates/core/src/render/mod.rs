//! Document rendering.
//!
//! Quotes and invoices render to single-font A4 PDFs; report tables render
//! to CSV.

mod error;
mod pdf;
mod tabular;

pub use error::RenderError;
pub use pdf::PdfRenderer;
pub use tabular::{Table, render_csv};

use crate::invoice::Invoice;
use crate::quote::Quote;
use crate::settings::BusinessSettings;

/// Renders business documents to bytes.
pub trait DocumentRenderer: Send + Sync {
    /// Renders a quote as PDF.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Pdf` if the document cannot be produced.
    fn render_quote_pdf(
        &self,
        quote: &Quote,
        settings: &BusinessSettings,
    ) -> Result<Vec<u8>, RenderError>;

    /// Renders an invoice as PDF.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Pdf` if the document cannot be produced.
    fn render_invoice_pdf(
        &self,
        invoice: &Invoice,
        settings: &BusinessSettings,
    ) -> Result<Vec<u8>, RenderError>;

    /// Renders a table as CSV.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Csv` if writing fails.
    fn render_tabular(&self, table: &Table) -> Result<Vec<u8>, RenderError> {
        render_csv(table)
    }
}
