//! Payment domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{InvoiceId, PaymentId, UserId};

/// Payment confirmation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Recorded, awaiting validation.
    Pending,
    /// Validated; counts toward the invoice's paid amount.
    Confirmed,
}

impl PaymentState {
    /// Returns the storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        }
    }

    /// Parses a storage name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// Invoice being paid.
    pub invoice_id: InvoiceId,
    /// Amount, always positive.
    pub amount: Decimal,
    /// Lowercased payment method (cash, transfer, card...).
    pub method: String,
    /// External reference such as a transfer number.
    pub reference: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Confirmation state.
    pub state: PaymentState,
    /// When the customer paid.
    pub paid_at: DateTime<Utc>,
    /// When it was confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Stored name of the uploaded proof.
    pub proof_file: Option<String>,
    /// Who recorded it.
    pub created_by: UserId,
    /// Record time.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a payment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    /// Invoice being paid.
    pub invoice_id: InvoiceId,
    /// Amount.
    pub amount: Decimal,
    /// Payment method.
    pub method: String,
    /// External reference.
    #[serde(default)]
    pub reference: Option<String>,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Payment time; defaults to now.
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Filter for listing payments.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    /// Only payments for this invoice.
    pub invoice_id: Option<InvoiceId>,
    /// Only payments in this state.
    pub state: Option<PaymentState>,
    /// Paid on or after this date.
    pub from: Option<NaiveDate>,
    /// Paid on or before this date.
    pub to: Option<NaiveDate>,
}

impl PaymentFilter {
    /// Filter for one invoice.
    #[must_use]
    pub fn for_invoice(invoice_id: InvoiceId) -> Self {
        Self {
            invoice_id: Some(invoice_id),
            ..Self::default()
        }
    }

    /// Returns true if the payment passes the filter.
    #[must_use]
    pub fn matches(&self, payment: &Payment) -> bool {
        let day = payment.paid_at.date_naive();
        self.invoice_id.is_none_or(|id| payment.invoice_id == id)
            && self.state.is_none_or(|s| payment.state == s)
            && self.from.is_none_or(|from| day >= from)
            && self.to.is_none_or(|to| day <= to)
    }
}

/// Confirmed total for one payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodTotal {
    /// Payment method.
    pub method: String,
    /// Sum of amounts.
    pub total: Decimal,
    /// Number of payments.
    pub count: u64,
}

/// Confirmed payments in a date range, grouped by method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    /// First day of the range.
    pub start: NaiveDate,
    /// Last day of the range.
    pub end: NaiveDate,
    /// Per-method totals, largest first.
    pub methods: Vec<MethodTotal>,
    /// Sum over all methods.
    pub total: Decimal,
    /// Number of payments.
    pub count: u64,
}

/// Statistics for one payment method over all states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodStats {
    /// Payment method.
    pub method: String,
    /// Sum of amounts.
    pub total: Decimal,
    /// Number of payments.
    pub count: u64,
    /// Average amount.
    pub average: Decimal,
}
