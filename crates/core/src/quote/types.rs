//! Quote domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{QuoteId, UserId};

use crate::auth::user::looks_like_email;
use crate::billing::{LineItem, Totals};

/// Quote status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    /// Awaiting a customer decision.
    Pending,
    /// Accepted by the customer, ready to invoice.
    Approved,
    /// Declined (terminal).
    Rejected,
    /// An invoice was derived from it (terminal).
    Invoiced,
}

impl QuoteStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Approved, Self::Rejected, Self::Invoiced];

    /// Returns the storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Invoiced => "invoiced",
        }
    }

    /// Parses a storage name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Returns true for transitions a user may request directly.
    ///
    /// `approved → invoiced` is reserved for invoice creation.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Approved | Self::Rejected)
        )
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Invoiced)
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer contact block, embedded in quotes and copied into invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Company name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Tax identification number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

impl Customer {
    /// Returns a list of problems with the required fields.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("customer name is required".to_string());
        }
        if self.email.trim().is_empty() {
            problems.push("customer email is required".to_string());
        } else if !looks_like_email(&self.email) {
            problems.push("customer email is invalid".to_string());
        }
        if self.phone.trim().is_empty() {
            problems.push("customer phone is required".to_string());
        }
        problems
    }

    /// Trims every field and drops empty optional fields.
    #[must_use]
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            company: clean(self.company),
            tax_id: clean(self.tax_id),
        }
    }
}

/// A stored quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Quote ID.
    pub id: QuoteId,
    /// `COT-<year>-<seq4>`.
    pub number: String,
    /// Customer contact.
    pub customer: Customer,
    /// Priced lines, in order.
    pub items: Vec<LineItem>,
    /// Sum of line totals.
    pub subtotal: Decimal,
    /// Tax on the subtotal.
    pub tax: Decimal,
    /// `subtotal + tax`.
    pub total: Decimal,
    /// Lifecycle status.
    pub status: QuoteStatus,
    /// Who created it.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// Returns the computed totals.
    #[must_use]
    pub const fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
        }
    }

    pub(crate) fn set_totals(&mut self, totals: Totals) {
        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.total = totals.total;
    }

    /// Returns true if `needle` (already lowercased) occurs in the number,
    /// customer name, company or email.
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let haystacks = [
            Some(self.number.as_str()),
            Some(self.customer.name.as_str()),
            self.customer.company.as_deref(),
            Some(self.customer.email.as_str()),
        ];
        haystacks
            .into_iter()
            .flatten()
            .any(|h| h.to_lowercase().contains(needle))
    }
}

/// Input for creating a quote.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuote {
    /// Customer contact.
    pub customer: Customer,
    /// Priced lines.
    pub items: Vec<LineItem>,
}

/// Partial update of a quote. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePatch {
    /// Replacement contact name.
    pub name: Option<String>,
    /// Replacement contact email.
    pub email: Option<String>,
    /// Replacement contact phone.
    pub phone: Option<String>,
    /// Replacement company.
    pub company: Option<String>,
    /// Replacement tax id.
    pub tax_id: Option<String>,
    /// Replacement items; totals are recomputed when present.
    pub items: Option<Vec<LineItem>>,
    /// Requested status transition.
    pub status: Option<QuoteStatus>,
}

impl QuotePatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.company.is_none()
            && self.tax_id.is_none()
            && self.items.is_none()
            && self.status.is_none()
    }
}

/// Filter for listing quotes.
#[derive(Debug, Clone, Default)]
pub struct QuoteFilter {
    /// Only quotes in this status.
    pub status: Option<QuoteStatus>,
    /// Created on or after this date.
    pub from: Option<NaiveDate>,
    /// Created on or before this date.
    pub to: Option<NaiveDate>,
}

impl QuoteFilter {
    /// Returns true if the quote passes the filter.
    #[must_use]
    pub fn matches(&self, quote: &Quote) -> bool {
        let day = quote.created_at.date_naive();
        self.status.is_none_or(|s| quote.status == s)
            && self.from.is_none_or(|from| day >= from)
            && self.to.is_none_or(|to| day <= to)
    }
}

/// Outcome of a guarded delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteDeletion {
    /// The quote was removed.
    Deleted,
    /// No quote with that id.
    NotFound,
    /// The quote is invoiced and was kept.
    Invoiced,
}

/// Aggregate figures over a set of quotes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuoteStats {
    /// Number of quotes.
    pub total: u64,
    /// Pending quotes.
    pub pending: u64,
    /// Approved quotes.
    pub approved: u64,
    /// Rejected quotes.
    pub rejected: u64,
    /// Invoiced quotes.
    pub invoiced: u64,
    /// Sum of totals.
    pub total_amount: Decimal,
    /// Average total, zero when there are no quotes.
    pub average_amount: Decimal,
}

impl QuoteStats {
    /// Computes statistics over quotes.
    #[must_use]
    pub fn from_quotes<'a>(quotes: impl IntoIterator<Item = &'a Quote>) -> Self {
        let mut stats = Self::default();
        for quote in quotes {
            stats.total += 1;
            stats.total_amount += quote.total;
            match quote.status {
                QuoteStatus::Pending => stats.pending += 1,
                QuoteStatus::Approved => stats.approved += 1,
                QuoteStatus::Rejected => stats.rejected += 1,
                QuoteStatus::Invoiced => stats.invoiced += 1,
            }
        }
        stats.average_amount = crate::billing::calculator::average(stats.total_amount, stats.total);
        stats
    }
}
