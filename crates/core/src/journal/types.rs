//! Journal domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{JournalEntryId, UserId};

/// Which side of the ledger a posting lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Debit.
    Debit,
    /// Credit.
    Credit,
}

/// Business nature of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Money in.
    Income,
    /// Money out.
    Expense,
    /// Correction or reclassification.
    Adjustment,
}

impl EntryKind {
    /// Returns the storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Adjustment => "adjustment",
        }
    }

    /// Parses a storage name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "adjustment" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

/// Income-statement category of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingCategory {
    /// Revenue.
    Income,
    /// Cost.
    Expense,
}

impl PostingCategory {
    /// Returns the display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

/// Entry confirmation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Recorded, not yet part of statements.
    Pending,
    /// Included in statements.
    Confirmed,
}

impl EntryState {
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

/// One debit or credit line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    /// Chart-of-accounts key.
    pub account: String,
    /// Debit or credit.
    pub side: Side,
    /// Positive amount.
    pub amount: Decimal,
    /// Income-statement category.
    #[serde(default)]
    pub category: Option<PostingCategory>,
    /// Income-statement subcategory.
    #[serde(default)]
    pub subcategory: Option<String>,
    /// Whether the posting moves cash.
    #[serde(default)]
    pub affects_cash: bool,
}

impl Posting {
    /// A plain debit.
    #[must_use]
    pub fn debit(account: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account: account.into(),
            side: Side::Debit,
            amount,
            category: None,
            subcategory: None,
            affects_cash: false,
        }
    }

    /// A plain credit.
    #[must_use]
    pub fn credit(account: impl Into<String>, amount: Decimal) -> Self {
        Self {
            side: Side::Credit,
            ..Self::debit(account, amount)
        }
    }

    /// Sets the category and subcategory.
    #[must_use]
    pub fn categorized(mut self, category: PostingCategory, subcategory: Option<&str>) -> Self {
        self.category = Some(category);
        self.subcategory = subcategory.map(str::to_string);
        self
    }

    /// Marks the posting as moving cash.
    #[must_use]
    pub const fn cash(mut self) -> Self {
        self.affects_cash = true;
        self
    }

    /// Signed contribution to the account balance (debit positive).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.side {
            Side::Debit => self.amount,
            Side::Credit => -self.amount,
        }
    }
}

/// A stored journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Accounting date.
    pub date: DateTime<Utc>,
    /// Business nature.
    pub kind: EntryKind,
    /// Human description.
    pub description: String,
    /// Source document id (payment id, invoice number...).
    pub reference: Option<String>,
    /// Postings, in order.
    pub postings: Vec<Posting>,
    /// Debit sum.
    pub total: Decimal,
    /// Confirmation state.
    pub state: EntryState,
    /// Who posted it.
    pub created_by: UserId,
    /// Record time.
    pub created_at: DateTime<Utc>,
    /// Confirmation time.
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    /// Returns true if any posting hits `account`.
    #[must_use]
    pub fn touches(&self, account: &str) -> bool {
        self.postings.iter().any(|p| p.account == account)
    }

    /// Accounting day.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Input for posting a journal entry.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryDraft {
    /// Accounting date; defaults to now.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Business nature.
    pub kind: EntryKind,
    /// Human description.
    pub description: String,
    /// Source document id.
    #[serde(default)]
    pub reference: Option<String>,
    /// Postings.
    pub postings: Vec<Posting>,
}

/// Filter for listing journal entries.
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    /// Only entries in this state.
    pub state: Option<EntryState>,
    /// Only entries of this kind.
    pub kind: Option<EntryKind>,
    /// Only entries with this reference.
    pub reference: Option<String>,
    /// Only entries touching this account.
    pub account: Option<String>,
    /// Dated on or after this day.
    pub from: Option<NaiveDate>,
    /// Dated on or before this day.
    pub to: Option<NaiveDate>,
}

impl JournalFilter {
    /// Confirmed entries dated within `[from, to]` (either bound optional).
    #[must_use]
    pub fn confirmed_between(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            state: Some(EntryState::Confirmed),
            from,
            to,
            ..Self::default()
        }
    }

    /// Returns true if the entry passes the filter.
    #[must_use]
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        let day = entry.day();
        self.state.is_none_or(|s| entry.state == s)
            && self.kind.is_none_or(|k| entry.kind == k)
            && self
                .reference
                .as_deref()
                .is_none_or(|r| entry.reference.as_deref() == Some(r))
            && self.account.as_deref().is_none_or(|a| entry.touches(a))
            && self.from.is_none_or(|from| day >= from)
            && self.to.is_none_or(|to| day <= to)
    }
}
