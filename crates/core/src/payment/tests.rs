use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{InvoiceId, PaymentId};

use super::*;
use crate::invoice::{Invoice, InvoiceFilter, InvoiceStatus, QuoteConversion};
use crate::journal::JournalFilter;
use crate::notification::NotificationKind;
use crate::storage::{FileStore, StorageError};
use crate::store::{InvoiceStore, StoreError, StoreResult};
use crate::testing::{Fixture, fixture, item, new_quote};

async fn invoice(f: &Fixture, price: Decimal) -> Invoice {
    let quote = f
        .services
        .quotes
        .create(&f.staff, new_quote(vec![item("A", price, 1)]))
        .await
        .unwrap();
    f.services.quotes.approve(&f.staff, quote.id).await.unwrap();
    f.services
        .invoices
        .create_from_quote(&f.staff, quote.id)
        .await
        .unwrap()
}

fn new_payment(invoice: &Invoice, amount: Decimal, method: &str) -> NewPayment {
    NewPayment {
        invoice_id: invoice.id,
        amount,
        method: method.to_string(),
        reference: Some(" REF-9 ".to_string()),
        notes: Some(String::new()),
        paid_at: None,
    }
}

#[tokio::test]
async fn test_create_normalizes_input() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;

    let payment = f
        .services
        .payments
        .create(&f.staff, new_payment(&inv, dec!(25), "  Cash "))
        .await
        .unwrap();
    assert_eq!(payment.method, "cash");
    assert_eq!(payment.reference.as_deref(), Some("REF-9"));
    assert!(payment.notes.is_none());
    assert_eq!(payment.state, PaymentState::Pending);
    assert!(payment.confirmed_at.is_none());
    assert_eq!(payment.created_by, f.staff.user_id);
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;
    let ledger = &f.services.payments;

    assert!(matches!(
        ledger.create(&f.staff, new_payment(&inv, dec!(0), "cash")).await,
        Err(PaymentError::NonPositiveAmount(_))
    ));
    assert!(matches!(
        ledger.create(&f.staff, new_payment(&inv, dec!(-5), "cash")).await,
        Err(PaymentError::NonPositiveAmount(_))
    ));
    assert!(matches!(
        ledger.create(&f.staff, new_payment(&inv, dec!(5), "  ")).await,
        Err(PaymentError::BlankMethod)
    ));
    assert!(ledger.by_invoice(inv.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_rejects_amounts_outside_money_column() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;
    let ledger = &f.services.payments;

    for amount in [dec!(0.004), dec!(10.125), Decimal::MAX] {
        let err = ledger
            .create(&f.staff, new_payment(&inv, amount, "cash"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidAmount(a) if a == amount));
        assert_eq!(err.http_status_code(), 400);
    }
    assert!(ledger.by_invoice(inv.id).await.unwrap().is_empty());
    assert!(f.services.journal.list(&JournalFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_payment_leaves_no_journal_entry() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;
    let ledger = &f.services.payments;

    let admitted = ledger
        .create(&f.staff, new_payment(&inv, dec!(100), "cash"))
        .await
        .unwrap();
    assert!(matches!(
        ledger.create(&f.staff, new_payment(&inv, dec!(50), "cash")).await,
        Err(PaymentError::ExceedsOutstanding { .. })
    ));

    let entries = f.services.journal.list(&JournalFilter::default()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].reference, Some(admitted.id.to_string()));
    assert_eq!(entries[0].total, dec!(100));
}

#[tokio::test]
async fn test_pending_payments_count_against_cap() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;
    let ledger = &f.services.payments;

    ledger.create(&f.staff, new_payment(&inv, dec!(60), "cash")).await.unwrap();
    let err = ledger
        .create(&f.staff, new_payment(&inv, dec!(50), "cash"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::ExceedsOutstanding { outstanding } if outstanding == dec!(47)));
}

#[tokio::test]
async fn test_concurrent_payments_never_overpay() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let ledger = f.services.payments.clone();
        let actor = f.staff.clone();
        let input = new_payment(&inv, dec!(30), "cash");
        handles.push(tokio::spawn(async move { ledger.create(&actor, input).await.is_ok() }));
    }
    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 3);
    let recorded: Decimal = f
        .services
        .payments
        .by_invoice(inv.id)
        .await
        .unwrap()
        .iter()
        .map(|p| p.amount)
        .sum();
    assert!(recorded <= inv.total);
}

#[tokio::test]
async fn test_confirm_is_idempotent() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;
    let ledger = &f.services.payments;
    let payment = ledger
        .create(&f.staff, new_payment(&inv, inv.total, "cash"))
        .await
        .unwrap();

    let first = ledger.confirm(&f.admin, payment.id).await.unwrap();
    assert_eq!(first.state, PaymentState::Confirmed);
    let settled = f.services.invoices.get(inv.id).await.unwrap();
    assert_eq!(settled.status, InvoiceStatus::Paid);

    let second = ledger.confirm(&f.admin, payment.id).await.unwrap();
    assert_eq!(second.confirmed_at, first.confirmed_at);
    assert_eq!(f.services.invoices.get(inv.id).await.unwrap(), settled);

    // the confirmation notice goes to whoever recorded the payment
    let notes = f.services.notifier.list(f.staff.user_id, 50).await.unwrap();
    let confirmations = notes
        .iter()
        .filter(|n| n.kind == NotificationKind::PaymentConfirmed)
        .count();
    assert_eq!(confirmations, 1);
    assert!(f.services.notifier.list(f.admin.user_id, 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_confirm_does_not_confirm_journal_entry() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;
    let payment = f
        .services
        .payments
        .create(&f.staff, new_payment(&inv, dec!(10), "cash"))
        .await
        .unwrap();
    f.services.payments.confirm(&f.admin, payment.id).await.unwrap();

    let entries = f.services.journal.by_reference(&payment.id.to_string()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].state, crate::journal::EntryState::Pending);
}

/// Invoice store whose first settlement fails.
struct FlakySettlement {
    inner: Arc<dyn InvoiceStore>,
    failed: AtomicBool,
}

#[async_trait]
impl InvoiceStore for FlakySettlement {
    async fn convert_quote(&self, invoice: &Invoice) -> StoreResult<QuoteConversion> {
        self.inner.convert_quote(invoice).await
    }

    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        self.inner.get_invoice(id).await
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> StoreResult<Vec<Invoice>> {
        self.inner.list_invoices(filter).await
    }

    async fn settle_invoice(
        &self,
        id: InvoiceId,
        method: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Invoice>> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.settle_invoice(id, method, at).await
    }
}

#[tokio::test]
async fn test_confirm_retry_settles_after_failed_settlement() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;
    let ledger = PaymentLedger::new(
        f.stores.payments.clone(),
        Arc::new(FlakySettlement {
            inner: f.stores.invoices.clone(),
            failed: AtomicBool::new(false),
        }),
        FileStore::memory().unwrap(),
        f.services.notifier.clone(),
    );
    let payment = ledger
        .create(&f.staff, new_payment(&inv, inv.total, "cash"))
        .await
        .unwrap();

    let err = ledger.confirm(&f.admin, payment.id).await.unwrap_err();
    assert!(matches!(err, PaymentError::Store(StoreError::Backend(_))));
    assert_eq!(
        ledger.get(payment.id).await.unwrap().state,
        PaymentState::Confirmed
    );
    assert_eq!(
        f.services.invoices.get(inv.id).await.unwrap().status,
        InvoiceStatus::Pending
    );

    let retried = ledger.confirm(&f.admin, payment.id).await.unwrap();
    assert_eq!(retried.state, PaymentState::Confirmed);
    let settled = f.services.invoices.get(inv.id).await.unwrap();
    assert_eq!(settled.status, InvoiceStatus::Paid);
    assert_eq!(settled.amount_paid, inv.total);
    assert_eq!(settled.payment_method.as_deref(), Some("cash"));
}

#[tokio::test]
async fn test_confirm_unknown_payment() {
    let f = fixture();
    assert!(matches!(
        f.services.payments.confirm(&f.admin, PaymentId::new()).await,
        Err(PaymentError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_proof_upload_and_replace() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;
    let ledger = &f.services.payments;
    let payment = ledger
        .create(&f.staff, new_payment(&inv, dec!(10), "transfer"))
        .await
        .unwrap();

    assert!(matches!(ledger.read_proof(payment.id).await, Err(PaymentError::NoProof(_))));

    let first = ledger
        .attach_proof(&f.staff, payment.id, "receipt.pdf", b"%PDF-1".to_vec())
        .await
        .unwrap();
    let second = ledger
        .attach_proof(&f.staff, payment.id, "receipt.png", b"png".to_vec())
        .await
        .unwrap();
    assert_ne!(first.proof_file, second.proof_file);

    let (name, bytes) = ledger.read_proof(payment.id).await.unwrap();
    assert!(name.ends_with("_receipt.png"));
    assert_eq!(bytes, b"png");

    let rejected = ledger
        .attach_proof(&f.staff, payment.id, "script.exe", b"MZ".to_vec())
        .await;
    assert!(matches!(
        rejected,
        Err(PaymentError::Storage(StorageError::DisallowedExtension { .. }))
    ));
}

#[tokio::test]
async fn test_queries_and_summaries() {
    let f = fixture();
    let inv = invoice(&f, dec!(100)).await;
    let ledger = &f.services.payments;
    let cash = ledger.create(&f.staff, new_payment(&inv, dec!(30), "cash")).await.unwrap();
    ledger.create(&f.staff, new_payment(&inv, dec!(20), "card")).await.unwrap();
    ledger.create(&f.staff, new_payment(&inv, dec!(10), "cash")).await.unwrap();
    ledger.confirm(&f.admin, cash.id).await.unwrap();

    assert_eq!(ledger.pending_validation().await.unwrap().len(), 2);
    assert_eq!(ledger.by_invoice(inv.id).await.unwrap().len(), 3);

    let today = Utc::now().date_naive();
    let summary = ledger.summary_by_method(today, today).await.unwrap();
    assert_eq!(summary.total, dec!(30));
    assert_eq!(summary.count, 1);
    assert_eq!(summary.methods[0].method, "cash");

    let stats = ledger.stats_by_method().await.unwrap();
    assert_eq!(stats[0].method, "cash");
    assert_eq!(stats[0].total, dec!(40));
    assert_eq!(stats[0].average, dec!(20));
    assert_eq!(stats[1].method, "card");

    let tomorrow = today.checked_add_days(Days::new(1)).unwrap();
    assert!(matches!(
        ledger.summary_by_method(tomorrow, today).await,
        Err(PaymentError::InvalidDateRange)
    ));
}
