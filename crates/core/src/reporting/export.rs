//! Flattening reports into tables for CSV export.

use chrono::{Days, NaiveDate};
use serde::Deserialize;

use super::error::ReportError;
use super::types::{
    CustomerSummary, FinancialReport, ReceivablesReport, ReportPeriod, SalesAnalysis,
    SalesGrouping,
};
use crate::invoice::Invoice;
use crate::journal::AgingReport;
use crate::payment::Payment;
use crate::quote::Quote;
use crate::render::Table;

/// Default export window when no dates are given.
const DEFAULT_EXPORT_DAYS: u64 = 30;

/// What to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Quotes created in range.
    Quotes,
    /// Invoices created in range.
    Invoices,
    /// Payments made in range.
    Payments,
    /// Sales analysis for the period.
    Sales,
    /// Financial report for the range.
    Financial,
    /// Unpaid invoices by age.
    Receivables,
    /// Journal receivables aging.
    Aging,
    /// Customer list.
    Customers,
}

impl ExportKind {
    /// Every export, in menu order.
    pub const ALL: [Self; 8] = [
        Self::Quotes,
        Self::Invoices,
        Self::Payments,
        Self::Sales,
        Self::Financial,
        Self::Receivables,
        Self::Aging,
        Self::Customers,
    ];

    /// Parses an export name.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::UnknownExport` for other names.
    pub fn parse(s: &str) -> Result<Self, ReportError> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or(ReportError::UnknownExport(wanted))
    }

    /// Name used in URLs and file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quotes => "quotes",
            Self::Invoices => "invoices",
            Self::Payments => "payments",
            Self::Sales => "sales",
            Self::Financial => "financial",
            Self::Receivables => "receivables",
            Self::Aging => "aging",
            Self::Customers => "customers",
        }
    }
}

/// Optional knobs shared by every export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    /// First day; defaults to 30 days before `end`.
    pub start: Option<NaiveDate>,
    /// Last day; defaults to today.
    pub end: Option<NaiveDate>,
    /// Window for the sales export.
    #[serde(default)]
    pub period: ReportPeriod,
    /// Grouping for the sales export.
    #[serde(default)]
    pub group_by: SalesGrouping,
}

impl ReportParams {
    /// Resolves the date range against `today`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` when start is after end.
    pub fn range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ReportError> {
        let end = self.end.unwrap_or(today);
        let start = self.start.unwrap_or_else(|| {
            end.checked_sub_days(Days::new(DEFAULT_EXPORT_DAYS))
                .unwrap_or(NaiveDate::MIN)
        });
        if start > end {
            return Err(ReportError::InvalidDateRange);
        }
        Ok((start, end))
    }
}

/// A rendered export ready to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// Suggested download name.
    pub file_name: String,
    /// MIME type.
    pub content_type: &'static str,
    /// File content.
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Wraps CSV bytes for an export run on `today`.
    #[must_use]
    pub fn csv(kind: ExportKind, today: NaiveDate, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{}_{}.csv", kind.as_str(), today.format("%Y%m%d")),
            content_type: "text/csv",
            bytes,
        }
    }
}

// ========== Tables ==========

pub(crate) fn quotes_table(quotes: &[Quote]) -> Table {
    let mut table = Table::new([
        "number", "date", "customer", "email", "company", "subtotal", "tax", "total", "status",
    ]);
    for q in quotes {
        table.push([
            q.number.clone(),
            q.created_at.date_naive().to_string(),
            q.customer.name.clone(),
            q.customer.email.clone(),
            q.customer.company.clone().unwrap_or_default(),
            q.subtotal.to_string(),
            q.tax.to_string(),
            q.total.to_string(),
            q.status.as_str().to_string(),
        ]);
    }
    table
}

pub(crate) fn invoices_table(invoices: &[Invoice]) -> Table {
    let mut table = Table::new([
        "number", "quote", "date", "customer", "email", "total", "paid", "balance", "status",
    ]);
    for i in invoices {
        table.push([
            i.number.clone(),
            i.quote_number.clone(),
            i.created_at.date_naive().to_string(),
            i.customer.name.clone(),
            i.customer.email.clone(),
            i.total.to_string(),
            i.amount_paid.to_string(),
            i.balance_due().to_string(),
            i.status.as_str().to_string(),
        ]);
    }
    table
}

pub(crate) fn payments_table(payments: &[Payment]) -> Table {
    let mut table = Table::new(["id", "invoice", "date", "amount", "method", "reference", "state"]);
    for p in payments {
        table.push([
            p.id.to_string(),
            p.invoice_id.to_string(),
            p.paid_at.date_naive().to_string(),
            p.amount.to_string(),
            p.method.clone(),
            p.reference.clone().unwrap_or_default(),
            p.state.as_str().to_string(),
        ]);
    }
    table
}

pub(crate) fn sales_table(sales: &SalesAnalysis) -> Table {
    let mut table = Table::new(["key", "quantity", "average_price", "total", "count"]);
    for row in &sales.rows {
        table.push([
            row.key.clone(),
            row.quantity.map(|q| q.to_string()).unwrap_or_default(),
            row.average_price.map(|p| p.to_string()).unwrap_or_default(),
            row.total.to_string(),
            row.count.to_string(),
        ]);
    }
    table
}

pub(crate) fn financial_table(report: &FinancialReport) -> Table {
    let mut table = Table::new(["metric", "value"]);
    table.push(["start".to_string(), report.start.to_string()]);
    table.push(["end".to_string(), report.end.to_string()]);
    table.push(["invoiced".to_string(), report.invoiced.to_string()]);
    table.push(["collected".to_string(), report.collected.to_string()]);
    table.push(["pending".to_string(), report.pending.to_string()]);
    table.push(["invoice_count".to_string(), report.invoice_count.to_string()]);
    table.push(["average_invoice".to_string(), report.average_invoice.to_string()]);
    table.push(["payment_count".to_string(), report.payment_count.to_string()]);
    for method in &report.collected_by_method {
        table.push([format!("collected_{}", method.method), method.total.to_string()]);
    }
    table
}

pub(crate) fn receivables_table(report: &ReceivablesReport) -> Table {
    let mut table = Table::new(["bucket", "number", "customer", "date", "days", "outstanding"]);
    for bucket in &report.buckets {
        for item in &bucket.invoices {
            table.push([
                bucket.bucket.label().to_string(),
                item.number.clone(),
                item.customer.clone(),
                item.date.to_string(),
                item.days.to_string(),
                item.outstanding.to_string(),
            ]);
        }
    }
    table
}

pub(crate) fn aging_table(report: &AgingReport) -> Table {
    let mut table = Table::new(["bucket", "total", "count"]);
    for bucket in &report.buckets {
        table.push([
            bucket.bucket.label().to_string(),
            bucket.total.to_string(),
            bucket.count.to_string(),
        ]);
    }
    table.push([
        "total_receivable".to_string(),
        report.total_receivable.to_string(),
        String::new(),
    ]);
    table.push([
        "total_overdue".to_string(),
        report.total_overdue.to_string(),
        String::new(),
    ]);
    table
}

pub(crate) fn customers_table(customers: &[CustomerSummary]) -> Table {
    let mut table = Table::new(["email", "name", "company", "total", "invoices", "last_purchase"]);
    for c in customers {
        table.push([
            c.email.clone(),
            c.name.clone(),
            c.company.clone().unwrap_or_default(),
            c.total.to_string(),
            c.invoice_count.to_string(),
            c.last_purchase.to_string(),
        ]);
    }
    table
}
