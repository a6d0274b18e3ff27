//! In-process store used by tests and `database.url = "memory"`.
//!
//! All collections live behind one lock, so every trait method is atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{InvoiceId, JournalEntryId, NotificationId, PaymentId, QuoteId, UserId};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ConfirmOutcome, CounterStore, InvoiceStore, JournalStore, NotificationStore, PaymentStore,
    QuoteStore, SettingsStore, StoreError, StoreResult, UserStore,
};
use crate::auth::User;
use crate::invoice::{Invoice, InvoiceFilter, QuoteConversion};
use crate::journal::{EntryState, JournalEntry, JournalFilter};
use crate::notification::Notification;
use crate::numbering::DocumentKind;
use crate::payment::{Payment, PaymentAdmission, PaymentFilter, PaymentState, admit_payment};
use crate::quote::{Quote, QuoteDeletion, QuoteFilter, QuoteStatus};
use crate::settings::BusinessSettings;

#[derive(Default)]
struct MemoryState {
    counters: HashMap<(DocumentKind, i32), u32>,
    quotes: HashMap<QuoteId, Quote>,
    invoices: HashMap<InvoiceId, Invoice>,
    payments: HashMap<PaymentId, Payment>,
    entries: HashMap<JournalEntryId, JournalEntry>,
    users: HashMap<UserId, User>,
    settings: Option<BusinessSettings>,
    notifications: Vec<Notification>,
}

impl MemoryState {
    fn payments_for(&self, invoice_id: InvoiceId) -> impl Iterator<Item = &Payment> {
        self.payments
            .values()
            .filter(move |p| p.invoice_id == invoice_id)
    }
}

/// Store backed by in-process maps.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
    items
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, kind: DocumentKind, year: i32) -> StoreResult<u32> {
        let mut state = self.state.write().await;
        let counter = state.counters.entry((kind, year)).or_insert(0);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| StoreError::Backend("document counter overflow".to_string()))?;
        Ok(*counter)
    }
}

#[async_trait]
impl QuoteStore for MemoryStore {
    async fn insert_quote(&self, quote: &Quote) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.quotes.values().any(|q| q.number == quote.number) {
            return Err(StoreError::Conflict(format!(
                "quote number {} already exists",
                quote.number
            )));
        }
        state.quotes.insert(quote.id, quote.clone());
        Ok(())
    }

    async fn get_quote(&self, id: QuoteId) -> StoreResult<Option<Quote>> {
        Ok(self.state.read().await.quotes.get(&id).cloned())
    }

    async fn replace_quote(&self, quote: &Quote, expected: QuoteStatus) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.quotes.get_mut(&quote.id) {
            Some(stored) if stored.status == expected => {
                *stored = quote.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_quote(&self, id: QuoteId) -> StoreResult<QuoteDeletion> {
        let mut state = self.state.write().await;
        match state.quotes.get(&id).map(|q| q.status) {
            None => Ok(QuoteDeletion::NotFound),
            Some(QuoteStatus::Invoiced) => Ok(QuoteDeletion::Invoiced),
            Some(_) => {
                state.quotes.remove(&id);
                Ok(QuoteDeletion::Deleted)
            }
        }
    }

    async fn list_quotes(&self, filter: &QuoteFilter) -> StoreResult<Vec<Quote>> {
        let state = self.state.read().await;
        let quotes = state
            .quotes
            .values()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect();
        Ok(newest_first(quotes, |q| q.created_at))
    }

    async fn search_quotes(&self, text: &str) -> StoreResult<Vec<Quote>> {
        let needle = text.trim().to_lowercase();
        let state = self.state.read().await;
        let quotes = state
            .quotes
            .values()
            .filter(|q| q.matches_text(&needle))
            .cloned()
            .collect();
        Ok(newest_first(quotes, |q| q.created_at))
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn convert_quote(&self, invoice: &Invoice) -> StoreResult<QuoteConversion> {
        let mut state = self.state.write().await;
        if state.invoices.values().any(|i| i.number == invoice.number) {
            return Err(StoreError::Conflict(format!(
                "invoice number {} already exists",
                invoice.number
            )));
        }
        let Some(quote) = state.quotes.get_mut(&invoice.quote_id) else {
            return Ok(QuoteConversion::QuoteMissing);
        };
        if quote.status != QuoteStatus::Approved {
            return Ok(QuoteConversion::QuoteNotApproved(quote.status));
        }
        quote.status = QuoteStatus::Invoiced;
        quote.updated_at = invoice.created_at;
        state.invoices.insert(invoice.id, invoice.clone());
        Ok(QuoteConversion::Converted)
    }

    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        Ok(self.state.read().await.invoices.get(&id).cloned())
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> StoreResult<Vec<Invoice>> {
        let state = self.state.read().await;
        let invoices = state
            .invoices
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        Ok(newest_first(invoices, |i| i.created_at))
    }

    async fn settle_invoice(
        &self,
        id: InvoiceId,
        method: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Invoice>> {
        let mut state = self.state.write().await;
        let confirmed: Decimal = state
            .payments_for(id)
            .filter(|p| p.state == PaymentState::Confirmed)
            .map(|p| p.amount)
            .sum();
        let Some(invoice) = state.invoices.get_mut(&id) else {
            return Ok(None);
        };
        invoice.apply_settlement(confirmed, method, at);
        Ok(Some(invoice.clone()))
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn insert_payment_within_balance(
        &self,
        payment: &Payment,
        entry: &JournalEntry,
    ) -> StoreResult<PaymentAdmission> {
        let mut state = self.state.write().await;
        let Some(total) = state.invoices.get(&payment.invoice_id).map(|i| i.total) else {
            return Ok(PaymentAdmission::InvoiceMissing);
        };
        let recorded: Decimal = state.payments_for(payment.invoice_id).map(|p| p.amount).sum();

        let admission = admit_payment(total, recorded, payment.amount);
        if admission == PaymentAdmission::Admitted {
            state.payments.insert(payment.id, payment.clone());
            state.entries.insert(entry.id, entry.clone());
        }
        Ok(admission)
    }

    async fn get_payment(&self, id: PaymentId) -> StoreResult<Option<Payment>> {
        Ok(self.state.read().await.payments.get(&id).cloned())
    }

    async fn confirm_payment(
        &self,
        id: PaymentId,
        at: DateTime<Utc>,
    ) -> StoreResult<ConfirmOutcome<Payment>> {
        let mut state = self.state.write().await;
        let Some(payment) = state.payments.get_mut(&id) else {
            return Ok(ConfirmOutcome::NotFound);
        };
        if payment.state == PaymentState::Confirmed {
            return Ok(ConfirmOutcome::AlreadyConfirmed(payment.clone()));
        }
        payment.state = PaymentState::Confirmed;
        payment.confirmed_at = Some(at);
        Ok(ConfirmOutcome::Confirmed(payment.clone()))
    }

    async fn set_payment_proof(
        &self,
        id: PaymentId,
        stored_name: &str,
    ) -> StoreResult<Option<Payment>> {
        let mut state = self.state.write().await;
        Ok(state.payments.get_mut(&id).map(|payment| {
            payment.proof_file = Some(stored_name.to_string());
            payment.clone()
        }))
    }

    async fn list_payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>> {
        let state = self.state.read().await;
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.paid_at, p.created_at));
        Ok(payments)
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    async fn insert_entry(&self, entry: &JournalEntry) -> StoreResult<()> {
        self.state
            .write()
            .await
            .entries
            .insert(entry.id, entry.clone());
        Ok(())
    }

    async fn get_entry(&self, id: JournalEntryId) -> StoreResult<Option<JournalEntry>> {
        Ok(self.state.read().await.entries.get(&id).cloned())
    }

    async fn confirm_entry(
        &self,
        id: JournalEntryId,
        at: DateTime<Utc>,
    ) -> StoreResult<ConfirmOutcome<JournalEntry>> {
        let mut state = self.state.write().await;
        let Some(entry) = state.entries.get_mut(&id) else {
            return Ok(ConfirmOutcome::NotFound);
        };
        if entry.state == EntryState::Confirmed {
            return Ok(ConfirmOutcome::AlreadyConfirmed(entry.clone()));
        }
        entry.state = EntryState::Confirmed;
        entry.confirmed_at = Some(at);
        Ok(ConfirmOutcome::Confirmed(entry.clone()))
    }

    async fn list_entries(&self, filter: &JournalFilter) -> StoreResult<Vec<JournalEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<JournalEntry> = state
            .entries
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.date, e.created_at));
        Ok(entries)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at, u.email.clone()));
        Ok(users)
    }

    async fn consume_reset_token(
        &self,
        id: UserId,
        token_id: Uuid,
        password_hash: &str,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&id) {
            Some(user) if user.reset_token_id == Some(token_id) => {
                user.password_hash = password_hash.to_string();
                user.reset_token_id = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load_settings(&self) -> StoreResult<Option<BusinessSettings>> {
        Ok(self.state.read().await.settings.clone())
    }

    async fn save_settings(&self, settings: &BusinessSettings) -> StoreResult<()> {
        self.state.write().await.settings = Some(settings.clone());
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.state
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn list_notifications(
        &self,
        user: UserId,
        limit: u64,
    ) -> StoreResult<Vec<Notification>> {
        let state = self.state.read().await;
        let mine: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.user_id == user)
            .cloned()
            .collect();
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(newest_first(mine, |n| n.created_at)
            .into_iter()
            .take(limit)
            .collect())
    }

    async fn count_unread(&self, user: UserId) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == user && !n.read)
            .count() as u64)
    }

    async fn mark_read(&self, user: UserId, id: NotificationId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user)
        {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user: UserId) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let mut changed = 0;
        for notification in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user && !n.read)
        {
            notification.read = true;
            changed += 1;
        }
        Ok(changed)
    }
}
