use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::AppError;
use tally_shared::types::{InvoiceId, PageRequest, QuoteId};

use super::*;
use crate::journal::accounts::{ACCOUNTS_RECEIVABLE, CASH};
use crate::journal::{EntryState, Side};
use crate::payment::PaymentError;
use crate::quote::QuoteStatus;
use crate::testing::{Fixture, fixture, item, new_quote};

async fn approved_quote(f: &Fixture, price: Decimal, quantity: i32) -> QuoteId {
    let quote = f
        .services
        .quotes
        .create(&f.staff, new_quote(vec![item("A", price, quantity)]))
        .await
        .unwrap();
    f.services.quotes.approve(&f.staff, quote.id).await.unwrap();
    quote.id
}

#[tokio::test]
async fn test_quote_to_paid_invoice_end_to_end() {
    let f = fixture();
    let s = &f.services;

    let quote = s
        .quotes
        .create(&f.staff, new_quote(vec![item("A", dec!(10), 2)]))
        .await
        .unwrap();
    assert_eq!(
        (quote.subtotal, quote.tax, quote.total),
        (dec!(20.00), dec!(1.40), dec!(21.40))
    );
    assert_eq!(quote.status, QuoteStatus::Pending);
    s.quotes.approve(&f.staff, quote.id).await.unwrap();

    let invoice = s.invoices.create_from_quote(&f.staff, quote.id).await.unwrap();
    assert_eq!(invoice.total, dec!(21.40));
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.quote_number, quote.number);
    assert_eq!(s.quotes.get(quote.id).await.unwrap().status, QuoteStatus::Invoiced);

    let payment = s
        .invoices
        .register_payment(&f.staff, invoice.id, dec!(21.40), "Transfer", Some("TX-1".into()))
        .await
        .unwrap();
    let entries = s.journal.by_reference(&payment.id.to_string()).await.unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.state, EntryState::Pending);
    assert_eq!(entry.total, dec!(21.40));
    assert_eq!(entry.description, format!("Payment for invoice {}", invoice.number));
    assert_eq!(entry.postings[0].account, CASH);
    assert_eq!(entry.postings[0].side, Side::Debit);
    assert_eq!(entry.postings[1].account, ACCOUNTS_RECEIVABLE);
    assert_eq!(entry.postings[1].side, Side::Credit);

    s.payments.confirm(&f.admin, payment.id).await.unwrap();
    let paid = s.invoices.get(invoice.id).await.unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert_eq!(paid.payment_method.as_deref(), Some("transfer"));
    assert!(paid.paid_at.is_some());

    s.journal.confirm(&f.admin, entry.id).await.unwrap();
    let sheet = s.journal.balance_sheet(Utc::now().date_naive()).await.unwrap();
    assert_eq!(sheet.balance_of(CASH), dec!(21.40));
    assert_eq!(sheet.balance_of(ACCOUNTS_RECEIVABLE), dec!(-21.40));
}

#[tokio::test]
async fn test_only_approved_quotes_are_invoiced() {
    let f = fixture();
    let s = &f.services;
    let pending = s
        .quotes
        .create(&f.staff, new_quote(vec![item("A", dec!(1), 1)]))
        .await
        .unwrap();
    let rejected = s
        .quotes
        .create(&f.staff, new_quote(vec![item("B", dec!(1), 1)]))
        .await
        .unwrap();
    s.quotes.reject(&f.staff, rejected.id).await.unwrap();

    for id in [pending.id, rejected.id] {
        let err = s.invoices.create_from_quote(&f.staff, id).await.unwrap_err();
        assert!(matches!(err, InvoiceError::QuoteNotApproved { .. }));
        assert!(matches!(AppError::from(err), AppError::InvalidState(_)));
    }
    assert!(matches!(
        s.invoices.create_from_quote(&f.staff, QuoteId::new()).await,
        Err(InvoiceError::QuoteNotFound(_))
    ));
}

#[tokio::test]
async fn test_quote_invoiced_exactly_once() {
    let f = fixture();
    let id = approved_quote(&f, dec!(10), 1).await;

    let first = f.services.invoices.create_from_quote(&f.staff, id).await.unwrap();
    assert!(first.number.starts_with("FAC-"));
    let second = f.services.invoices.create_from_quote(&f.staff, id).await;
    assert!(matches!(
        second,
        Err(InvoiceError::QuoteNotApproved {
            status: QuoteStatus::Invoiced,
            ..
        })
    ));
    assert_eq!(f.services.invoices.stats().await.unwrap().total, 1);
}

#[tokio::test]
async fn test_concurrent_invoicing_yields_one_invoice() {
    let f = fixture();
    let id = approved_quote(&f, dec!(10), 1).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let invoices = f.services.invoices.clone();
        let actor = f.staff.clone();
        handles.push(tokio::spawn(async move {
            invoices.create_from_quote(&actor, id).await.is_ok()
        }));
    }
    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_partial_payments_settle_progressively() {
    let f = fixture();
    let s = &f.services;
    let id = approved_quote(&f, dec!(10), 2).await;
    let invoice = s.invoices.create_from_quote(&f.staff, id).await.unwrap();

    let first = s
        .invoices
        .register_payment(&f.staff, invoice.id, dec!(10.00), "cash", None)
        .await
        .unwrap();
    assert_eq!(s.invoices.get(invoice.id).await.unwrap().status, InvoiceStatus::Pending);

    s.payments.confirm(&f.admin, first.id).await.unwrap();
    let partial = s.invoices.get(invoice.id).await.unwrap();
    assert_eq!(partial.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(partial.amount_paid, dec!(10.00));
    assert_eq!(partial.balance_due(), dec!(11.40));
    assert!(partial.paid_at.is_none());

    let second = s
        .invoices
        .register_payment(&f.staff, invoice.id, dec!(11.40), "card", None)
        .await
        .unwrap();
    s.payments.confirm(&f.admin, second.id).await.unwrap();
    let paid = s.invoices.get(invoice.id).await.unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert_eq!(paid.amount_paid, dec!(21.40));
    assert_eq!(paid.payment_method.as_deref(), Some("card"));
}

#[tokio::test]
async fn test_payment_cap_boundaries() {
    let f = fixture();
    let s = &f.services;
    // 93.46 * 1.07 = 100.0022, rounded to 100.00
    let id = approved_quote(&f, dec!(93.46), 1).await;
    let invoice = s.invoices.create_from_quote(&f.staff, id).await.unwrap();
    assert_eq!(invoice.total, dec!(100.00));

    let over = s
        .invoices
        .register_payment(&f.staff, invoice.id, dec!(100.01), "cash", None)
        .await
        .unwrap_err();
    assert!(matches!(over, PaymentError::ExceedsOutstanding { outstanding } if outstanding == dec!(100.00)));
    assert!(matches!(AppError::from(over), AppError::Validation(_)));

    s.invoices
        .register_payment(&f.staff, invoice.id, dec!(100.00), "cash", None)
        .await
        .unwrap();

    let extra = s
        .invoices
        .register_payment(&f.staff, invoice.id, dec!(0.01), "cash", None)
        .await;
    assert!(matches!(extra, Err(PaymentError::ExceedsOutstanding { .. })));
}

#[tokio::test]
async fn test_pending_list_and_filters() {
    let f = fixture();
    let s = &f.services;
    let a = s
        .invoices
        .create_from_quote(&f.staff, approved_quote(&f, dec!(10), 1).await)
        .await
        .unwrap();
    let b = s
        .invoices
        .create_from_quote(&f.staff, approved_quote(&f, dec!(20), 1).await)
        .await
        .unwrap();
    let payment = s
        .invoices
        .register_payment(&f.staff, b.id, b.total, "cash", None)
        .await
        .unwrap();
    s.payments.confirm(&f.admin, payment.id).await.unwrap();

    let pending = s.invoices.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, a.id);

    let paid = s
        .invoices
        .list(
            &InvoiceFilter {
                status: Some(InvoiceStatus::Paid),
                ..InvoiceFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(paid.meta.total, 1);
    assert_eq!(paid.data[0].id, b.id);

    let stats = s.invoices.stats().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.paid, 1);
    assert_eq!(stats.total_collected, b.total);

    let today = Utc::now().date_naive();
    let reversed = InvoiceFilter {
        from: today.succ_opt(),
        to: Some(today),
        ..InvoiceFilter::default()
    };
    assert!(matches!(
        s.invoices.list(&reversed, PageRequest::default()).await,
        Err(InvoiceError::InvalidDateRange)
    ));
}

#[tokio::test]
async fn test_unknown_invoice() {
    let f = fixture();
    assert!(matches!(
        f.services.invoices.get(InvoiceId::new()).await,
        Err(InvoiceError::NotFound(_))
    ));
    assert!(matches!(
        f.services
            .invoices
            .register_payment(&f.staff, InvoiceId::new(), dec!(1), "cash", None)
            .await,
        Err(PaymentError::InvoiceNotFound(_))
    ));
}

#[tokio::test]
async fn test_invoice_creation_notifies_actor() {
    let f = fixture();
    let id = approved_quote(&f, dec!(10), 1).await;
    f.services.invoices.create_from_quote(&f.staff, id).await.unwrap();

    let notes = f.services.notifier.list(f.staff.user_id, 50).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, crate::notification::NotificationKind::InvoiceCreated);
}
