//! Report shapes and the pure functions that build them.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::InvoiceId;

use super::error::ReportError;
use crate::billing::{average, percentage};
use crate::invoice::{Invoice, InvoiceStats, InvoiceStatus};
use crate::journal::aging::{AgingBucket, AgingReport, age_in_days, aging_bucket_for_days};
use crate::payment::service::summarize;
use crate::payment::{MethodStats, MethodTotal, Payment, PaymentState};
use crate::quote::{Quote, QuoteStats};

// ========== Periods ==========

/// Rolling window ending today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    /// Last 30 days.
    #[default]
    Month,
    /// Last 90 days.
    Quarter,
    /// Last 365 days.
    Year,
}

impl ReportPeriod {
    /// Parses a period name.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::UnknownPeriod` for other names.
    pub fn parse(s: &str) -> Result<Self, ReportError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            other => Err(ReportError::UnknownPeriod(other.to_string())),
        }
    }

    /// Length of the window in days.
    #[must_use]
    pub const fn days(self) -> u64 {
        match self {
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }

    /// `(today - days, today)`.
    #[must_use]
    pub fn window(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_days(Days::new(self.days()))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }
}

/// How sales are grouped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesGrouping {
    /// By item description.
    #[default]
    Product,
    /// By customer name.
    Client,
    /// By calendar day.
    Date,
}

impl SalesGrouping {
    /// Parses a grouping name.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::UnknownGrouping` for other names.
    pub fn parse(s: &str) -> Result<Self, ReportError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(Self::Product),
            "client" => Ok(Self::Client),
            "date" => Ok(Self::Date),
            other => Err(ReportError::UnknownGrouping(other.to_string())),
        }
    }
}

// ========== Dashboard ==========

/// Headline figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    /// Sum of invoice totals.
    pub total_sales: Decimal,
    /// Sum of confirmed payments on those invoices.
    pub total_collected: Decimal,
    /// `total_sales - total_collected`.
    pub receivable: Decimal,
    /// Invoices per hundred quotes, zero without quotes.
    pub conversion_rate: Decimal,
    /// Average invoice total.
    pub average_ticket: Decimal,
}

impl DashboardKpis {
    /// Computes the figures from the quote count and invoices of a window.
    #[must_use]
    pub fn compute(quote_count: u64, invoices: &[Invoice]) -> Self {
        let total_sales: Decimal = invoices.iter().map(|i| i.total).sum();
        let total_collected: Decimal = invoices.iter().map(|i| i.amount_paid).sum();
        let invoice_count = invoices.len() as u64;
        Self {
            total_sales,
            total_collected,
            receivable: total_sales - total_collected,
            conversion_rate: percentage(invoice_count, quote_count),
            average_ticket: average(total_sales, invoice_count),
        }
    }
}

/// Everything the dashboard shows for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Window size.
    pub period: ReportPeriod,
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
    /// Headline figures.
    pub kpis: DashboardKpis,
    /// Quote statistics.
    pub quotes: QuoteStats,
    /// Invoice statistics.
    pub invoices: InvoiceStats,
    /// Payment statistics per method.
    pub payments: Vec<MethodStats>,
    /// Daily series.
    pub trends: Vec<TrendPoint>,
}

// ========== Trends ==========

/// One day of activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Day.
    pub date: NaiveDate,
    /// Quotes created.
    pub quote_count: u64,
    /// Sum of their totals.
    pub quote_total: Decimal,
    /// Invoices created.
    pub invoice_count: u64,
    /// Sum of their totals.
    pub invoice_total: Decimal,
}

impl TrendPoint {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            quote_count: 0,
            quote_total: Decimal::ZERO,
            invoice_count: 0,
            invoice_total: Decimal::ZERO,
        }
    }
}

/// One zero-filled point per day in `[start, end]`.
#[must_use]
pub fn trend_series(
    start: NaiveDate,
    end: NaiveDate,
    quotes: &[Quote],
    invoices: &[Invoice],
) -> Vec<TrendPoint> {
    let mut points: BTreeMap<NaiveDate, TrendPoint> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| (d, TrendPoint::empty(d)))
        .collect();

    for quote in quotes {
        if let Some(point) = points.get_mut(&quote.created_at.date_naive()) {
            point.quote_count += 1;
            point.quote_total += quote.total;
        }
    }
    for invoice in invoices {
        if let Some(point) = points.get_mut(&invoice.created_at.date_naive()) {
            point.invoice_count += 1;
            point.invoice_total += invoice.total;
        }
    }
    points.into_values().collect()
}

// ========== Sales ==========

/// One group of sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRow {
    /// Description, customer name or `YYYY-MM-DD`.
    pub key: String,
    /// Units sold (product grouping only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    /// Mean unit price (product grouping only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_price: Option<Decimal>,
    /// Sales amount.
    pub total: Decimal,
    /// Lines (product) or invoices (client, date).
    pub count: u64,
}

/// Sales in a window, grouped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalysis {
    /// Window size.
    pub period: ReportPeriod,
    /// Grouping.
    pub group_by: SalesGrouping,
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
    /// Groups, largest total first (chronological for dates).
    pub rows: Vec<SalesRow>,
}

#[derive(Default)]
struct SalesAccumulator {
    quantity: i64,
    price_sum: Decimal,
    total: Decimal,
    count: u64,
}

impl SalesAnalysis {
    /// Groups the invoices.
    #[must_use]
    pub fn build(
        period: ReportPeriod,
        group_by: SalesGrouping,
        start: NaiveDate,
        end: NaiveDate,
        invoices: &[Invoice],
    ) -> Self {
        let mut groups: BTreeMap<String, SalesAccumulator> = BTreeMap::new();
        for invoice in invoices {
            match group_by {
                SalesGrouping::Product => {
                    for item in &invoice.items {
                        let slot = groups.entry(item.description.clone()).or_default();
                        slot.quantity += i64::from(item.quantity);
                        slot.price_sum += item.unit_price;
                        slot.total += item.line_total();
                        slot.count += 1;
                    }
                }
                SalesGrouping::Client => {
                    let slot = groups.entry(invoice.customer.name.clone()).or_default();
                    slot.total += invoice.total;
                    slot.count += 1;
                }
                SalesGrouping::Date => {
                    let day = invoice.created_at.date_naive().format("%Y-%m-%d").to_string();
                    let slot = groups.entry(day).or_default();
                    slot.total += invoice.total;
                    slot.count += 1;
                }
            }
        }

        let product = group_by == SalesGrouping::Product;
        let mut rows: Vec<SalesRow> = groups
            .into_iter()
            .map(|(key, acc)| SalesRow {
                key,
                quantity: product.then_some(acc.quantity),
                average_price: product.then(|| average(acc.price_sum, acc.count)),
                total: acc.total,
                count: acc.count,
            })
            .collect();
        if group_by != SalesGrouping::Date {
            rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
        }

        Self {
            period,
            group_by,
            start,
            end,
            rows,
        }
    }
}

// ========== Financial ==========

/// Invoiced versus collected over a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
    /// Sum of invoice totals.
    pub invoiced: Decimal,
    /// Sum of confirmed payments.
    pub collected: Decimal,
    /// `invoiced - collected`.
    pub pending: Decimal,
    /// Number of invoices.
    pub invoice_count: u64,
    /// Average invoice total.
    pub average_invoice: Decimal,
    /// Number of confirmed payments.
    pub payment_count: u64,
    /// Confirmed payments per method.
    pub collected_by_method: Vec<MethodTotal>,
}

impl FinancialReport {
    /// Builds the report from invoices created and payments made in range.
    #[must_use]
    pub fn build(
        start: NaiveDate,
        end: NaiveDate,
        invoices: &[Invoice],
        payments: &[Payment],
    ) -> Self {
        let confirmed: Vec<Payment> = payments
            .iter()
            .filter(|p| p.state == PaymentState::Confirmed)
            .cloned()
            .collect();
        let summary = summarize(start, end, &confirmed);
        let invoiced: Decimal = invoices.iter().map(|i| i.total).sum();
        let invoice_count = invoices.len() as u64;

        Self {
            start,
            end,
            invoiced,
            collected: summary.total,
            pending: invoiced - summary.total,
            invoice_count,
            average_invoice: average(invoiced, invoice_count),
            payment_count: summary.count,
            collected_by_method: summary.methods,
        }
    }
}

// ========== Receivables ==========

/// One unpaid invoice in the receivables report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivableItem {
    /// Invoice ID.
    pub invoice_id: InvoiceId,
    /// Invoice number.
    pub number: String,
    /// Customer name.
    pub customer: String,
    /// Creation day.
    pub date: NaiveDate,
    /// Days since creation.
    pub days: i64,
    /// `total - amount_paid`.
    pub outstanding: Decimal,
}

/// Unpaid invoices in one aging bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivableBucket {
    /// Bucket.
    pub bucket: AgingBucket,
    /// Sum of outstanding amounts.
    pub total: Decimal,
    /// Number of invoices.
    pub count: u64,
    /// The invoices, oldest first.
    pub invoices: Vec<ReceivableItem>,
}

/// Unpaid invoices aged by creation date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesReport {
    /// Reference day.
    pub as_of: NaiveDate,
    /// All four buckets, youngest first.
    pub buckets: Vec<ReceivableBucket>,
    /// Sum of outstanding amounts.
    pub total_receivable: Decimal,
    /// Outstanding older than 30 days.
    pub total_overdue: Decimal,
}

impl ReceivablesReport {
    /// Ages every invoice not yet fully paid.
    #[must_use]
    pub fn build(as_of: NaiveDate, invoices: &[Invoice]) -> Self {
        let mut items: Vec<ReceivableItem> = invoices
            .iter()
            .filter(|i| i.status != InvoiceStatus::Paid)
            .map(|i| {
                let date = i.created_at.date_naive();
                ReceivableItem {
                    invoice_id: i.id,
                    number: i.number.clone(),
                    customer: i.customer.name.clone(),
                    date,
                    days: age_in_days(date, as_of),
                    outstanding: i.balance_due(),
                }
            })
            .collect();
        items.sort_by_key(|i| std::cmp::Reverse(i.days));

        let summary = AgingReport::build(as_of, items.iter().map(|i| (i.date, i.outstanding)));
        let buckets = summary
            .buckets
            .iter()
            .map(|b| ReceivableBucket {
                bucket: b.bucket,
                total: b.total,
                count: b.count,
                invoices: items
                    .iter()
                    .filter(|i| aging_bucket_for_days(i.days) == b.bucket)
                    .cloned()
                    .collect(),
            })
            .collect();

        Self {
            as_of,
            buckets,
            total_receivable: summary.total_receivable,
            total_overdue: summary.total_overdue,
        }
    }
}

// ========== Customers ==========

/// A product and how many units a customer bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFrequency {
    /// Item description.
    pub description: String,
    /// Units bought.
    pub quantity: i64,
}

/// One invoice in a customer's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Invoice ID.
    pub invoice_id: InvoiceId,
    /// Invoice number.
    pub number: String,
    /// Creation day.
    pub date: NaiveDate,
    /// Invoice total.
    pub total: Decimal,
    /// Payment status.
    pub status: InvoiceStatus,
}

/// Lifetime view of one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAnalysis {
    /// Customer email (the key).
    pub email: String,
    /// Most recent customer name.
    pub name: String,
    /// Sum of invoice totals.
    pub total: Decimal,
    /// Number of invoices.
    pub invoice_count: u64,
    /// Average invoice total.
    pub average: Decimal,
    /// Top products by units, at most five.
    pub top_products: Vec<ProductFrequency>,
    /// Invoices, newest first.
    pub history: Vec<PurchaseRecord>,
}

const TOP_PRODUCTS: usize = 5;

impl CustomerAnalysis {
    /// Builds the analysis from the customer's invoices. `None` when there
    /// are none.
    #[must_use]
    pub fn build(email: &str, invoices: &[Invoice]) -> Option<Self> {
        let mut mine: Vec<&Invoice> = invoices
            .iter()
            .filter(|i| i.customer.email.eq_ignore_ascii_case(email.trim()))
            .collect();
        if mine.is_empty() {
            return None;
        }
        mine.sort_by_key(|i| std::cmp::Reverse(i.created_at));

        let mut units: HashMap<&str, i64> = HashMap::new();
        for item in mine.iter().flat_map(|i| i.items.iter()) {
            *units.entry(item.description.as_str()).or_default() += i64::from(item.quantity);
        }
        let mut top_products: Vec<ProductFrequency> = units
            .into_iter()
            .map(|(description, quantity)| ProductFrequency {
                description: description.to_string(),
                quantity,
            })
            .collect();
        top_products.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then_with(|| a.description.cmp(&b.description))
        });
        top_products.truncate(TOP_PRODUCTS);

        let total: Decimal = mine.iter().map(|i| i.total).sum();
        let invoice_count = mine.len() as u64;
        Some(Self {
            email: mine[0].customer.email.to_lowercase(),
            name: mine[0].customer.name.clone(),
            total,
            invoice_count,
            average: average(total, invoice_count),
            top_products,
            history: mine
                .iter()
                .map(|i| PurchaseRecord {
                    invoice_id: i.id,
                    number: i.number.clone(),
                    date: i.created_at.date_naive(),
                    total: i.total,
                    status: i.status,
                })
                .collect(),
        })
    }
}

/// One row of the customer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    /// Customer email (the key).
    pub email: String,
    /// Most recent customer name.
    pub name: String,
    /// Most recent company.
    pub company: Option<String>,
    /// Sum of invoice totals.
    pub total: Decimal,
    /// Number of invoices.
    pub invoice_count: u64,
    /// Last invoice day.
    pub last_purchase: NaiveDate,
}

/// One summary per customer email, largest total first.
#[must_use]
pub fn customer_summaries(invoices: &[Invoice]) -> Vec<CustomerSummary> {
    let mut by_email: HashMap<String, CustomerSummary> = HashMap::new();
    let mut sorted: Vec<&Invoice> = invoices.iter().collect();
    sorted.sort_by_key(|i| i.created_at);

    for invoice in sorted {
        let email = invoice.customer.email.to_lowercase();
        let day = invoice.created_at.date_naive();
        let row = by_email
            .entry(email.clone())
            .or_insert_with(|| CustomerSummary {
                email,
                name: String::new(),
                company: None,
                total: Decimal::ZERO,
                invoice_count: 0,
                last_purchase: day,
            });
        row.name.clone_from(&invoice.customer.name);
        row.company.clone_from(&invoice.customer.company);
        row.total += invoice.total;
        row.invoice_count += 1;
        row.last_purchase = day;
    }

    let mut rows: Vec<CustomerSummary> = by_email.into_values().collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.email.cmp(&b.email)));
    rows
}
