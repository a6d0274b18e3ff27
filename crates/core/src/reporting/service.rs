//! Report service.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use super::error::ReportError;
use super::export::{
    ExportFile, ExportKind, ReportParams, aging_table, customers_table, financial_table,
    invoices_table, payments_table, quotes_table, receivables_table, sales_table,
};
use super::types::{
    CustomerAnalysis, CustomerSummary, Dashboard, DashboardKpis, FinancialReport, ReceivablesReport,
    ReportPeriod, SalesAnalysis, SalesGrouping, TrendPoint, customer_summaries, trend_series,
};
use crate::invoice::{Invoice, InvoiceFilter, InvoiceStats};
use crate::journal::Journal;
use crate::payment::service::method_stats;
use crate::payment::{Payment, PaymentFilter, PaymentState};
use crate::quote::{Quote, QuoteFilter, QuoteStats};
use crate::render::DocumentRenderer;
use crate::store::{InvoiceStore, PaymentStore, QuoteStore};

/// Longest range served as a per-day series, about two years.
pub const MAX_TREND_DAYS: i64 = 731;

/// Builds dashboards, analyses and exports on demand.
#[derive(Clone)]
pub struct ReportService {
    quotes: Arc<dyn QuoteStore>,
    invoices: Arc<dyn InvoiceStore>,
    payments: Arc<dyn PaymentStore>,
    journal: Journal,
    renderer: Arc<dyn DocumentRenderer>,
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService").finish_non_exhaustive()
    }
}

impl ReportService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        quotes: Arc<dyn QuoteStore>,
        invoices: Arc<dyn InvoiceStore>,
        payments: Arc<dyn PaymentStore>,
        journal: Journal,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            quotes,
            invoices,
            payments,
            journal,
            renderer,
        }
    }

    // ========== Dashboard ==========

    /// Headline figures, statistics and trends for the period ending today.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Store` if a store fails.
    pub async fn dashboard(
        &self,
        period: ReportPeriod,
        today: NaiveDate,
    ) -> Result<Dashboard, ReportError> {
        let (start, end) = period.window(today);
        let quotes = self.quotes_between(start, end).await?;
        let invoices = self.invoices_between(start, end).await?;
        let payments = self
            .payments
            .list_payments(&PaymentFilter {
                from: Some(start),
                to: Some(end),
                ..PaymentFilter::default()
            })
            .await?;

        Ok(Dashboard {
            period,
            start,
            end,
            kpis: DashboardKpis::compute(quotes.len() as u64, &invoices),
            quotes: QuoteStats::from_quotes(&quotes),
            invoices: InvoiceStats::from_invoices(&invoices),
            payments: method_stats(&payments),
            trends: trend_series(start, end, &quotes, &invoices),
        })
    }

    /// One zero-filled point per day in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange`, `RangeTooLong` or a store failure.
    pub async fn trends(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TrendPoint>, ReportError> {
        check_range(start, end)?;
        let days = (end - start).num_days() + 1;
        if days > MAX_TREND_DAYS {
            return Err(ReportError::RangeTooLong {
                days,
                max: MAX_TREND_DAYS,
            });
        }
        let quotes = self.quotes_between(start, end).await?;
        let invoices = self.invoices_between(start, end).await?;
        Ok(trend_series(start, end, &quotes, &invoices))
    }

    // ========== Analyses ==========

    /// Invoices of the period grouped by product, client or date.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Store` if a store fails.
    pub async fn sales_analysis(
        &self,
        period: ReportPeriod,
        group_by: SalesGrouping,
        today: NaiveDate,
    ) -> Result<SalesAnalysis, ReportError> {
        let (start, end) = period.window(today);
        let invoices = self.invoices_between(start, end).await?;
        Ok(SalesAnalysis::build(period, group_by, start, end, &invoices))
    }

    /// Invoiced versus collected in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a store failure.
    pub async fn financial_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FinancialReport, ReportError> {
        check_range(start, end)?;
        let invoices = self.invoices_between(start, end).await?;
        let payments = self.confirmed_payments_between(start, end).await?;
        Ok(FinancialReport::build(start, end, &invoices, &payments))
    }

    /// Unpaid invoices aged by creation date.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Store` if a store fails.
    pub async fn receivables_report(
        &self,
        today: NaiveDate,
    ) -> Result<ReceivablesReport, ReportError> {
        let invoices = self
            .invoices
            .list_invoices(&InvoiceFilter {
                unpaid_only: true,
                ..InvoiceFilter::default()
            })
            .await?;
        Ok(ReceivablesReport::build(today, &invoices))
    }

    /// Lifetime view of the customer with this email.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` when the customer has no invoices.
    pub async fn customer_analysis(&self, email: &str) -> Result<CustomerAnalysis, ReportError> {
        let invoices = self
            .invoices
            .list_invoices(&InvoiceFilter {
                customer_email: Some(email.to_string()),
                ..InvoiceFilter::default()
            })
            .await?;
        CustomerAnalysis::build(email, &invoices)
            .ok_or_else(|| ReportError::CustomerNotFound(email.trim().to_lowercase()))
    }

    /// One row per customer, largest total first.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Store` if a store fails.
    pub async fn customers(&self) -> Result<Vec<CustomerSummary>, ReportError> {
        let invoices = self.invoices.list_invoices(&InvoiceFilter::default()).await?;
        Ok(customer_summaries(&invoices))
    }

    // ========== Export ==========

    /// Flattens a report into a table and renders it as CSV.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange`, a store failure or a render failure.
    pub async fn export(
        &self,
        kind: ExportKind,
        params: &ReportParams,
        today: NaiveDate,
    ) -> Result<ExportFile, ReportError> {
        let (start, end) = params.range(today)?;
        let table = match kind {
            ExportKind::Quotes => quotes_table(&self.quotes_between(start, end).await?),
            ExportKind::Invoices => invoices_table(&self.invoices_between(start, end).await?),
            ExportKind::Payments => {
                let payments = self
                    .payments
                    .list_payments(&PaymentFilter {
                        from: Some(start),
                        to: Some(end),
                        ..PaymentFilter::default()
                    })
                    .await?;
                payments_table(&payments)
            }
            ExportKind::Sales => {
                sales_table(&self.sales_analysis(params.period, params.group_by, today).await?)
            }
            ExportKind::Financial => financial_table(&self.financial_report(start, end).await?),
            ExportKind::Receivables => receivables_table(&self.receivables_report(today).await?),
            ExportKind::Aging => aging_table(&self.journal.receivables_aging(today).await?),
            ExportKind::Customers => customers_table(&self.customers().await?),
        };

        let bytes = self.renderer.render_tabular(&table)?;
        info!(
            export = kind.as_str(),
            rows = table.rows.len(),
            bytes = bytes.len(),
            "report exported"
        );
        Ok(ExportFile::csv(kind, today, bytes))
    }

    async fn quotes_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Quote>, ReportError> {
        let filter = QuoteFilter {
            from: Some(start),
            to: Some(end),
            ..QuoteFilter::default()
        };
        Ok(self.quotes.list_quotes(&filter).await?)
    }

    async fn invoices_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Invoice>, ReportError> {
        let filter = InvoiceFilter {
            from: Some(start),
            to: Some(end),
            ..InvoiceFilter::default()
        };
        Ok(self.invoices.list_invoices(&filter).await?)
    }

    async fn confirmed_payments_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Payment>, ReportError> {
        let filter = PaymentFilter {
            state: Some(PaymentState::Confirmed),
            from: Some(start),
            to: Some(end),
            ..PaymentFilter::default()
        };
        Ok(self.payments.list_payments(&filter).await?)
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ReportError> {
    if start > end {
        return Err(ReportError::InvalidDateRange);
    }
    Ok(())
}
