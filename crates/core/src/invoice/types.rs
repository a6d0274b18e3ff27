//! Invoice domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{InvoiceId, QuoteId, UserId};

use crate::billing::{LineItem, average};
use crate::quote::{Customer, Quote, QuoteStatus};

/// Invoice payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// No confirmed payments yet.
    Pending,
    /// Some, but not all, of the total is confirmed.
    PartiallyPaid,
    /// Confirmed payments reach the total.
    Paid,
}

impl InvoiceStatus {
    /// All statuses.
    pub const ALL: [Self; 3] = [Self::Pending, Self::PartiallyPaid, Self::Paid];

    /// Returns the storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
        }
    }

    /// Parses a storage name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Derives the status from the confirmed amount.
    #[must_use]
    pub fn for_amount_paid(total: Decimal, amount_paid: Decimal) -> Self {
        if amount_paid >= total {
            Self::Paid
        } else if amount_paid > Decimal::ZERO {
            Self::PartiallyPaid
        } else {
            Self::Pending
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Invoice ID.
    pub id: InvoiceId,
    /// `FAC-<year>-<seq4>`.
    pub number: String,
    /// Source quote.
    pub quote_id: QuoteId,
    /// Source quote number.
    pub quote_number: String,
    /// Customer snapshot.
    pub customer: Customer,
    /// Item snapshot.
    pub items: Vec<LineItem>,
    /// Frozen subtotal.
    pub subtotal: Decimal,
    /// Frozen tax.
    pub tax: Decimal,
    /// Frozen total.
    pub total: Decimal,
    /// Sum of confirmed payments.
    pub amount_paid: Decimal,
    /// Payment status.
    pub status: InvoiceStatus,
    /// Method of the payment that settled the invoice.
    pub payment_method: Option<String>,
    /// When the invoice became fully paid.
    pub paid_at: Option<DateTime<Utc>>,
    /// Who created it.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Builds a pending invoice snapshot from a quote.
    #[must_use]
    pub fn from_quote(
        quote: &Quote,
        number: String,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InvoiceId::new(),
            number,
            quote_id: quote.id,
            quote_number: quote.number.clone(),
            customer: quote.customer.clone(),
            items: quote.items.clone(),
            subtotal: quote.subtotal,
            tax: quote.tax,
            total: quote.total,
            amount_paid: Decimal::ZERO,
            status: InvoiceStatus::Pending,
            payment_method: None,
            paid_at: None,
            created_by,
            created_at,
        }
    }

    /// Amount not yet confirmed.
    #[must_use]
    pub fn balance_due(&self) -> Decimal {
        (self.total - self.amount_paid).max(Decimal::ZERO)
    }

    /// Applies the current confirmed-payment sum.
    ///
    /// `method` and `at` are recorded only on the transition into `paid`.
    pub fn apply_settlement(&mut self, confirmed: Decimal, method: &str, at: DateTime<Utc>) {
        let was_paid = self.status == InvoiceStatus::Paid;
        self.amount_paid = confirmed;
        self.status = InvoiceStatus::for_amount_paid(self.total, confirmed);
        if self.status == InvoiceStatus::Paid && !was_paid {
            self.payment_method = Some(method.to_string());
            self.paid_at = Some(at);
        }
    }
}

/// Outcome of the atomic quote-to-invoice conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteConversion {
    /// Invoice inserted and quote marked invoiced.
    Converted,
    /// The quote no longer exists.
    QuoteMissing,
    /// The quote was not approved at write time.
    QuoteNotApproved(QuoteStatus),
}

/// Filter for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Only invoices in this status.
    pub status: Option<InvoiceStatus>,
    /// Only invoices not yet fully paid.
    pub unpaid_only: bool,
    /// Customer email, case-insensitive.
    pub customer_email: Option<String>,
    /// Created on or after this date.
    pub from: Option<NaiveDate>,
    /// Created on or before this date.
    pub to: Option<NaiveDate>,
}

impl InvoiceFilter {
    /// Returns true if the invoice passes the filter.
    #[must_use]
    pub fn matches(&self, invoice: &Invoice) -> bool {
        let day = invoice.created_at.date_naive();
        self.status.is_none_or(|s| invoice.status == s)
            && (!self.unpaid_only || invoice.status != InvoiceStatus::Paid)
            && self
                .customer_email
                .as_deref()
                .is_none_or(|e| invoice.customer.email.eq_ignore_ascii_case(e.trim()))
            && self.from.is_none_or(|from| day >= from)
            && self.to.is_none_or(|to| day <= to)
    }
}

/// Aggregate figures over a set of invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceStats {
    /// Number of invoices.
    pub total: u64,
    /// Pending invoices.
    pub pending: u64,
    /// Partially paid invoices.
    pub partially_paid: u64,
    /// Paid invoices.
    pub paid: u64,
    /// Sum of invoice totals.
    pub total_amount: Decimal,
    /// Average invoice total.
    pub average_amount: Decimal,
    /// Sum of confirmed payments.
    pub total_collected: Decimal,
}

impl InvoiceStats {
    /// Computes statistics over invoices.
    #[must_use]
    pub fn from_invoices<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> Self {
        let mut stats = Self::default();
        for invoice in invoices {
            stats.total += 1;
            stats.total_amount += invoice.total;
            stats.total_collected += invoice.amount_paid;
            match invoice.status {
                InvoiceStatus::Pending => stats.pending += 1,
                InvoiceStatus::PartiallyPaid => stats.partially_paid += 1,
                InvoiceStatus::Paid => stats.paid += 1,
            }
        }
        stats.average_amount = average(stats.total_amount, stats.total);
        stats
    }
}
