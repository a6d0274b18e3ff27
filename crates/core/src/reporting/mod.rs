//! Read-only reporting over quotes, invoices, payments and the journal.
//!
//! Every report is computed on demand from the stores; nothing here
//! writes. Exports flatten a report into a [`Table`](crate::render::Table)
//! and render it as CSV.

pub mod error;
pub mod export;
pub mod service;
pub mod types;


pub use error::ReportError;
pub use export::{ExportFile, ExportKind, ReportParams};
pub use service::ReportService;
pub use types::{
    CustomerAnalysis, CustomerSummary, Dashboard, DashboardKpis, FinancialReport,
    ProductFrequency, PurchaseRecord, ReceivableBucket, ReceivableItem, ReceivablesReport,
    ReportPeriod, SalesAnalysis, SalesGrouping, SalesRow, TrendPoint,
};
