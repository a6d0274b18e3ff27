//! Payment ledger service.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tally_shared::types::{InvoiceId, PaymentId};
use tracing::{info, warn};

use super::error::PaymentError;
use super::rules::PaymentAdmission;
use super::types::{
    MethodStats, MethodTotal, NewPayment, Payment, PaymentFilter, PaymentState, PaymentSummary,
};
use crate::auth::Actor;
use crate::billing::{average, is_money_amount};
use crate::journal::accounts::{ACCOUNTS_RECEIVABLE, CASH, SALES_SUBCATEGORY};
use crate::journal::{EntryDraft, EntryKind, Journal, Posting, PostingCategory};
use crate::notification::{NotificationKind, Notifier};
use crate::storage::FileStore;
use crate::store::{ConfirmOutcome, InvoiceStore, PaymentStore};

/// Records, confirms and summarizes payments.
#[derive(Clone)]
pub struct PaymentLedger {
    payments: Arc<dyn PaymentStore>,
    invoices: Arc<dyn InvoiceStore>,
    files: FileStore,
    notifier: Notifier,
}

impl std::fmt::Debug for PaymentLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentLedger").finish_non_exhaustive()
    }
}

impl PaymentLedger {
    /// Creates the ledger.
    #[must_use]
    pub fn new(
        payments: Arc<dyn PaymentStore>,
        invoices: Arc<dyn InvoiceStore>,
        files: FileStore,
        notifier: Notifier,
    ) -> Self {
        Self {
            payments,
            invoices,
            files,
            notifier,
        }
    }

    // ========== Writes ==========

    /// Records a pending payment and posts its journal entry.
    ///
    /// The outstanding-balance check, the payment insert and the journal
    /// entry insert are one atomic store operation, so concurrent payments
    /// can never overpay an invoice and a payment never exists without its
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `InvalidAmount`, `BlankMethod`,
    /// `InvoiceNotFound` or `ExceedsOutstanding`.
    pub async fn create(&self, actor: &Actor, input: NewPayment) -> Result<Payment, PaymentError> {
        if input.amount <= Decimal::ZERO {
            return Err(PaymentError::NonPositiveAmount(input.amount));
        }
        if !is_money_amount(input.amount) {
            return Err(PaymentError::InvalidAmount(input.amount));
        }
        let method = input.method.trim().to_lowercase();
        if method.is_empty() {
            return Err(PaymentError::BlankMethod);
        }
        let invoice = self
            .invoices
            .get_invoice(input.invoice_id)
            .await?
            .ok_or(PaymentError::InvoiceNotFound(input.invoice_id))?;

        let now = Utc::now();
        let payment = Payment {
            id: PaymentId::new(),
            invoice_id: invoice.id,
            amount: input.amount,
            method,
            reference: clean(input.reference),
            notes: clean(input.notes),
            state: PaymentState::Pending,
            paid_at: input.paid_at.unwrap_or(now),
            confirmed_at: None,
            proof_file: None,
            created_by: actor.user_id,
            created_at: now,
        };

        let entry = Journal::prepare_entry(
            actor,
            EntryDraft {
                date: Some(payment.paid_at),
                kind: EntryKind::Income,
                description: format!("Payment for invoice {}", invoice.number),
                reference: Some(payment.id.to_string()),
                postings: vec![
                    Posting::debit(CASH, payment.amount)
                        .categorized(PostingCategory::Income, Some(SALES_SUBCATEGORY))
                        .cash(),
                    Posting::credit(ACCOUNTS_RECEIVABLE, payment.amount),
                ],
            },
        )?;

        match self
            .payments
            .insert_payment_within_balance(&payment, &entry)
            .await?
        {
            PaymentAdmission::Admitted => {}
            PaymentAdmission::InvoiceMissing => {
                return Err(PaymentError::InvoiceNotFound(invoice.id));
            }
            PaymentAdmission::ExceedsOutstanding { outstanding } => {
                info!(
                    invoice_id = %invoice.id,
                    amount = %payment.amount,
                    outstanding = %outstanding,
                    "payment rejected: exceeds outstanding balance"
                );
                return Err(PaymentError::ExceedsOutstanding { outstanding });
            }
        }

        info!(
            payment_id = %payment.id,
            invoice_id = %invoice.id,
            amount = %payment.amount,
            method = %payment.method,
            entry_id = %entry.id,
            "payment recorded"
        );
        self.notifier
            .notify(
                actor.user_id,
                NotificationKind::PaymentRegistered,
                format!("Payment of {} registered for invoice {}", payment.amount, invoice.number),
                json!({
                    "paymentId": payment.id,
                    "invoiceId": invoice.id,
                    "invoiceNumber": invoice.number,
                    "amount": payment.amount,
                }),
            )
            .await;

        Ok(payment)
    }

    /// Confirms a pending payment and settles its invoice.
    ///
    /// Confirming an already confirmed payment returns it unchanged and
    /// sends no second notification, but settles the invoice again so a
    /// retry after a failed settlement repairs the invoice. Settlement
    /// recomputes from confirmed payments, so repeating it is harmless.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` for unknown ids, or a store error
    /// if the invoice could not be settled.
    pub async fn confirm(&self, actor: &Actor, id: PaymentId) -> Result<Payment, PaymentError> {
        let outcome = self.payments.confirm_payment(id, Utc::now()).await?;
        let (payment, newly_confirmed) = match outcome {
            ConfirmOutcome::Confirmed(payment) => (payment, true),
            ConfirmOutcome::AlreadyConfirmed(payment) => (payment, false),
            ConfirmOutcome::NotFound => return Err(PaymentError::NotFound(id)),
        };

        let at = payment.confirmed_at.unwrap_or_else(Utc::now);
        let invoice = self
            .invoices
            .settle_invoice(payment.invoice_id, &payment.method, at)
            .await
            .inspect_err(|e| {
                warn!(payment_id = %id, error = %e, "settlement failed for confirmed payment");
            })?;
        if !newly_confirmed {
            return Ok(payment);
        }

        match &invoice {
            Some(invoice) => info!(
                payment_id = %id,
                invoice_id = %invoice.id,
                amount_paid = %invoice.amount_paid,
                status = invoice.status.as_str(),
                user_id = %actor.user_id,
                "payment confirmed"
            ),
            None => warn!(payment_id = %id, invoice_id = %payment.invoice_id, "confirmed payment has no invoice"),
        }

        self.notifier
            .notify(
                payment.created_by,
                NotificationKind::PaymentConfirmed,
                format!("Payment of {} confirmed", payment.amount),
                json!({
                    "paymentId": payment.id,
                    "invoiceId": payment.invoice_id,
                    "invoiceStatus": invoice.as_ref().map(|i| i.status.as_str()),
                    "amount": payment.amount,
                }),
            )
            .await;

        Ok(payment)
    }

    /// Stores a proof file and attaches it to the payment. A previous
    /// proof is replaced and deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a `Storage` error for rejected uploads.
    pub async fn attach_proof(
        &self,
        actor: &Actor,
        id: PaymentId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Payment, PaymentError> {
        let previous = self.get(id).await?.proof_file;
        let stored = self.files.save(file_name, bytes).await?;

        let Some(payment) = self.payments.set_payment_proof(id, &stored.name).await? else {
            self.discard(&stored.name).await;
            return Err(PaymentError::NotFound(id));
        };
        if let Some(previous) = previous {
            self.discard(&previous).await;
        }

        info!(payment_id = %id, file = %stored.name, size = stored.size, "payment proof attached");
        self.notifier
            .notify(
                actor.user_id,
                NotificationKind::ProofUploaded,
                format!("Proof uploaded for payment of {}", payment.amount),
                json!({
                    "paymentId": payment.id,
                    "invoiceId": payment.invoice_id,
                    "file": stored.name,
                }),
            )
            .await;

        Ok(payment)
    }

    /// Reads the proof file of a payment, returning its stored name and bytes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NoProof` or a `Storage` error.
    pub async fn read_proof(&self, id: PaymentId) -> Result<(String, Vec<u8>), PaymentError> {
        let payment = self.get(id).await?;
        let name = payment.proof_file.ok_or(PaymentError::NoProof(id))?;
        let bytes = self.files.read(&name).await?;
        Ok((name, bytes))
    }

    async fn discard(&self, name: &str) {
        if let Err(e) = self.files.delete(name).await {
            warn!(error = %e, file = %name, "failed to delete proof file");
        }
    }

    // ========== Queries ==========

    /// Loads a payment.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` for unknown ids.
    pub async fn get(&self, id: PaymentId) -> Result<Payment, PaymentError> {
        self.payments
            .get_payment(id)
            .await?
            .ok_or(PaymentError::NotFound(id))
    }

    /// Payments recorded against one invoice, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` for unknown invoices.
    pub async fn by_invoice(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, PaymentError> {
        if self.invoices.get_invoice(invoice_id).await?.is_none() {
            return Err(PaymentError::InvoiceNotFound(invoice_id));
        }
        Ok(self
            .payments
            .list_payments(&PaymentFilter::for_invoice(invoice_id))
            .await?)
    }

    /// Payments matching the filter, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a store failure.
    pub async fn list(&self, filter: &PaymentFilter) -> Result<Vec<Payment>, PaymentError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from > to
        {
            return Err(PaymentError::InvalidDateRange);
        }
        Ok(self.payments.list_payments(filter).await?)
    }

    /// Confirmed payments in `[start, end]` grouped by method.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a store failure.
    pub async fn summary_by_method(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PaymentSummary, PaymentError> {
        let filter = PaymentFilter {
            state: Some(PaymentState::Confirmed),
            from: Some(start),
            to: Some(end),
            ..PaymentFilter::default()
        };
        let payments = self.list(&filter).await?;
        Ok(summarize(start, end, &payments))
    }

    /// Pending payments awaiting confirmation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Store` if the store fails.
    pub async fn pending_validation(&self) -> Result<Vec<Payment>, PaymentError> {
        let filter = PaymentFilter {
            state: Some(PaymentState::Pending),
            ..PaymentFilter::default()
        };
        Ok(self.payments.list_payments(&filter).await?)
    }

    /// Total, count and average per method over payments in every state.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Store` if the store fails.
    pub async fn stats_by_method(&self) -> Result<Vec<MethodStats>, PaymentError> {
        let payments = self.payments.list_payments(&PaymentFilter::default()).await?;
        Ok(method_stats(&payments))
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn group_by_method(payments: &[Payment]) -> BTreeMap<&str, (Decimal, u64)> {
    let mut groups: BTreeMap<&str, (Decimal, u64)> = BTreeMap::new();
    for payment in payments {
        let slot = groups.entry(payment.method.as_str()).or_default();
        slot.0 += payment.amount;
        slot.1 += 1;
    }
    groups
}

/// Groups payments by method, largest total first.
#[must_use]
pub fn summarize(start: NaiveDate, end: NaiveDate, payments: &[Payment]) -> PaymentSummary {
    let mut methods: Vec<MethodTotal> = group_by_method(payments)
        .into_iter()
        .map(|(method, (total, count))| MethodTotal {
            method: method.to_string(),
            total,
            count,
        })
        .collect();
    methods.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.method.cmp(&b.method)));

    PaymentSummary {
        start,
        end,
        total: methods.iter().map(|m| m.total).sum(),
        count: methods.iter().map(|m| m.count).sum(),
        methods,
    }
}

/// Per-method totals, counts and averages, largest total first.
#[must_use]
pub fn method_stats(payments: &[Payment]) -> Vec<MethodStats> {
    let mut stats: Vec<MethodStats> = group_by_method(payments)
        .into_iter()
        .map(|(method, (total, count))| MethodStats {
            method: method.to_string(),
            total,
            count,
            average: average(total, count),
        })
        .collect();
    stats.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.method.cmp(&b.method)));
    stats
}
