//! Persistence seams.
//!
//! Every service receives its stores at construction as `Arc<dyn …Store>`.
//! Operations that must not race (counter increments, quote conversion,
//! payment admission, confirmations, settlement) are single trait methods
//! so each backend can make them atomic.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tally_shared::AppError;
use tally_shared::types::{InvoiceId, JournalEntryId, NotificationId, PaymentId, QuoteId, UserId};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::User;
use crate::invoice::{Invoice, InvoiceFilter, QuoteConversion};
use crate::journal::{JournalEntry, JournalFilter};
use crate::notification::Notification;
use crate::numbering::DocumentKind;
use crate::payment::{Payment, PaymentAdmission, PaymentFilter};
use crate::quote::{Quote, QuoteDeletion, QuoteFilter, QuoteStatus};
use crate::settings::BusinessSettings;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The backend failed or is unreachable.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Conflict(_) => "CONFLICT",
            Self::Corrupt(_) | Self::Backend(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Conflict(_) => 409,
            Self::Corrupt(_) | Self::Backend(_) => 500,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::InvalidState(msg),
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// Outcome of an idempotent `pending → confirmed` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome<T> {
    /// This call performed the transition.
    Confirmed(T),
    /// The record was already confirmed; nothing changed.
    AlreadyConfirmed(T),
    /// No record with that id.
    NotFound,
}

/// Per-(kind, year) document counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments and returns the counter, starting at 1.
    async fn increment(&self, kind: DocumentKind, year: i32) -> StoreResult<u32>;
}

/// Quote records.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Inserts a new quote.
    async fn insert_quote(&self, quote: &Quote) -> StoreResult<()>;

    /// Loads a quote.
    async fn get_quote(&self, id: QuoteId) -> StoreResult<Option<Quote>>;

    /// Replaces a quote if its stored status still equals `expected`.
    ///
    /// Returns false when the quote is missing or its status changed.
    async fn replace_quote(&self, quote: &Quote, expected: QuoteStatus) -> StoreResult<bool>;

    /// Deletes a quote unless it is invoiced.
    async fn delete_quote(&self, id: QuoteId) -> StoreResult<QuoteDeletion>;

    /// Lists quotes matching the filter, newest first.
    async fn list_quotes(&self, filter: &QuoteFilter) -> StoreResult<Vec<Quote>>;

    /// Case-insensitive literal substring search over number, customer
    /// name, company and email, newest first.
    async fn search_quotes(&self, text: &str) -> StoreResult<Vec<Quote>>;
}

/// Invoice records.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Atomically flips the source quote `approved → invoiced` and inserts
    /// the invoice. Nothing is written unless the quote is still approved.
    async fn convert_quote(&self, invoice: &Invoice) -> StoreResult<QuoteConversion>;

    /// Loads an invoice.
    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>>;

    /// Lists invoices matching the filter, newest first.
    async fn list_invoices(&self, filter: &InvoiceFilter) -> StoreResult<Vec<Invoice>>;

    /// Atomically recomputes the confirmed-payment sum of an invoice and
    /// applies it with [`Invoice::apply_settlement`].
    async fn settle_invoice(
        &self,
        id: InvoiceId,
        method: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Invoice>>;
}

/// Payment records.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Atomically checks the payment against its invoice's outstanding
    /// balance with [`crate::payment::admit_payment`] and, only when
    /// admitted, inserts the payment together with its journal entry.
    /// Either both rows are written or neither is.
    async fn insert_payment_within_balance(
        &self,
        payment: &Payment,
        entry: &JournalEntry,
    ) -> StoreResult<PaymentAdmission>;

    /// Loads a payment.
    async fn get_payment(&self, id: PaymentId) -> StoreResult<Option<Payment>>;

    /// Idempotent `pending → confirmed`.
    async fn confirm_payment(
        &self,
        id: PaymentId,
        at: DateTime<Utc>,
    ) -> StoreResult<ConfirmOutcome<Payment>>;

    /// Sets the proof file, returning the updated payment.
    async fn set_payment_proof(
        &self,
        id: PaymentId,
        stored_name: &str,
    ) -> StoreResult<Option<Payment>>;

    /// Lists payments matching the filter, oldest first.
    async fn list_payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>>;
}

/// Journal entries.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Inserts a new entry.
    async fn insert_entry(&self, entry: &JournalEntry) -> StoreResult<()>;

    /// Loads an entry.
    async fn get_entry(&self, id: JournalEntryId) -> StoreResult<Option<JournalEntry>>;

    /// Idempotent `pending → confirmed`.
    async fn confirm_entry(
        &self,
        id: JournalEntryId,
        at: DateTime<Utc>,
    ) -> StoreResult<ConfirmOutcome<JournalEntry>>;

    /// Lists entries matching the filter, ordered by date.
    async fn list_entries(&self, filter: &JournalFilter) -> StoreResult<Vec<JournalEntry>>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; `StoreError::Conflict` if the email is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    /// Loads a user by id.
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Loads a user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Replaces a user record.
    async fn update_user(&self, user: &User) -> StoreResult<bool>;

    /// Lists all users, oldest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Sets a new password hash and clears the reset token, but only while
    /// `token_id` is still the user's outstanding reset token. Returns
    /// false if the token was already used or superseded.
    async fn consume_reset_token(
        &self,
        id: UserId,
        token_id: Uuid,
        password_hash: &str,
    ) -> StoreResult<bool>;
}

/// The singleton settings record.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Loads the settings, if ever saved.
    async fn load_settings(&self) -> StoreResult<Option<BusinessSettings>>;

    /// Saves the settings (upsert).
    async fn save_settings(&self, settings: &BusinessSettings) -> StoreResult<()>;
}

/// Notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Inserts a notification.
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()>;

    /// Lists a user's notifications, newest first.
    async fn list_notifications(&self, user: UserId, limit: u64)
    -> StoreResult<Vec<Notification>>;

    /// Counts a user's unread notifications.
    async fn count_unread(&self, user: UserId) -> StoreResult<u64>;

    /// Marks one notification read. False if it is not the user's.
    async fn mark_read(&self, user: UserId, id: NotificationId) -> StoreResult<bool>;

    /// Marks every notification of a user read, returning how many changed.
    async fn mark_all_read(&self, user: UserId) -> StoreResult<u64>;
}

/// Every store handle the services need.
#[derive(Clone)]
pub struct Stores {
    /// Document counters.
    pub counters: Arc<dyn CounterStore>,
    /// Quotes.
    pub quotes: Arc<dyn QuoteStore>,
    /// Invoices.
    pub invoices: Arc<dyn InvoiceStore>,
    /// Payments.
    pub payments: Arc<dyn PaymentStore>,
    /// Journal entries.
    pub journal: Arc<dyn JournalStore>,
    /// Users.
    pub users: Arc<dyn UserStore>,
    /// Settings.
    pub settings: Arc<dyn SettingsStore>,
    /// Notifications.
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    /// Uses one backend for every store.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CounterStore
            + QuoteStore
            + InvoiceStore
            + PaymentStore
            + JournalStore
            + UserStore
            + SettingsStore
            + NotificationStore
            + 'static,
    {
        Self {
            counters: backend.clone(),
            quotes: backend.clone(),
            invoices: backend.clone(),
            payments: backend.clone(),
            journal: backend.clone(),
            users: backend.clone(),
            settings: backend.clone(),
            notifications: backend,
        }
    }

    /// A fresh in-process store.
    #[must_use]
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(memory::MemoryStore::new()))
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
