use chrono::Utc;
use rust_decimal_macros::dec;
use tally_shared::AppError;
use tally_shared::types::{PageRequest, QuoteId};

use super::*;
use crate::billing::BillingError;
use crate::settings::SettingsPatch;
use crate::testing::{customer, fixture, item, new_quote};

#[tokio::test]
async fn test_create_prices_and_numbers() {
    let f = fixture();
    let quote = f
        .services
        .quotes
        .create(&f.staff, new_quote(vec![item("A", dec!(10), 2)]))
        .await
        .unwrap();

    assert_eq!(quote.subtotal, dec!(20.00));
    assert_eq!(quote.tax, dec!(1.40));
    assert_eq!(quote.total, dec!(21.40));
    assert_eq!(quote.status, QuoteStatus::Pending);
    assert_eq!(quote.created_by, f.staff.user_id);
    assert_eq!(quote.number, format!("COT-{}-0001", Utc::now().format("%Y")));

    let second = f
        .services
        .quotes
        .create(&f.staff, new_quote(vec![item("B", dec!(1), 1)]))
        .await
        .unwrap();
    assert!(second.number.ends_with("-0002"));
}

#[tokio::test]
async fn test_create_uses_saved_tax_rate() {
    let f = fixture();
    f.services
        .settings
        .update(
            &f.admin,
            SettingsPatch {
                tax_rate: Some(dec!(0.10)),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();

    let quote = f
        .services
        .quotes
        .create(&f.staff, new_quote(vec![item("A", dec!(10), 2)]))
        .await
        .unwrap();
    assert_eq!(quote.tax, dec!(2.00));
    assert_eq!(quote.total, dec!(22.00));
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let f = fixture();
    let quotes = &f.services.quotes;

    let empty = quotes.create(&f.staff, new_quote(vec![])).await;
    assert!(matches!(empty, Err(QuoteError::Billing(BillingError::NoItems))));

    let mut input = new_quote(vec![item("A", dec!(1), 1)]);
    input.customer = customer("Ana", "not-an-email");
    let err = quotes.create(&f.staff, input).await.unwrap_err();
    assert!(matches!(err, QuoteError::InvalidCustomer(_)));
    assert_eq!(AppError::from(err).status_code(), 400);

    let zero_qty = quotes.create(&f.staff, new_quote(vec![item("A", dec!(1), 0)])).await;
    assert!(matches!(zero_qty, Err(QuoteError::Billing(_))));
}

#[tokio::test]
async fn test_approve_and_reject_transitions() {
    let f = fixture();
    let quotes = &f.services.quotes;
    let a = quotes.create(&f.staff, new_quote(vec![item("A", dec!(1), 1)])).await.unwrap();
    let b = quotes.create(&f.staff, new_quote(vec![item("B", dec!(1), 1)])).await.unwrap();

    assert_eq!(quotes.approve(&f.staff, a.id).await.unwrap().status, QuoteStatus::Approved);
    assert_eq!(quotes.reject(&f.staff, b.id).await.unwrap().status, QuoteStatus::Rejected);

    let err = quotes.approve(&f.staff, b.id).await.unwrap_err();
    assert!(matches!(
        err,
        QuoteError::InvalidTransition {
            from: QuoteStatus::Rejected,
            to: QuoteStatus::Approved
        }
    ));
    assert_eq!(AppError::from(err).status_code(), 409);
}

#[tokio::test]
async fn test_update_merges_and_reprices() {
    let f = fixture();
    let quotes = &f.services.quotes;
    let quote = quotes.create(&f.staff, new_quote(vec![item("A", dec!(10), 2)])).await.unwrap();

    let patch = QuotePatch {
        company: Some("Acme".to_string()),
        items: Some(vec![item("A", dec!(10), 3)]),
        ..QuotePatch::default()
    };
    let updated = quotes.update(&f.staff, quote.id, patch).await.unwrap();

    assert_eq!(updated.customer.name, "Ana Diaz");
    assert_eq!(updated.customer.company.as_deref(), Some("Acme"));
    assert_eq!(updated.subtotal, dec!(30));
    assert_eq!(updated.total, dec!(32.10));
    assert_eq!(quotes.get(quote.id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_invoiced_quote_is_frozen() {
    let f = fixture();
    let quotes = &f.services.quotes;
    let quote = quotes.create(&f.staff, new_quote(vec![item("A", dec!(10), 2)])).await.unwrap();
    quotes.approve(&f.staff, quote.id).await.unwrap();
    f.services.invoices.create_from_quote(&f.staff, quote.id).await.unwrap();

    let patch = QuotePatch {
        name: Some("Someone Else".to_string()),
        ..QuotePatch::default()
    };
    assert!(matches!(
        quotes.update(&f.staff, quote.id, patch).await,
        Err(QuoteError::Invoiced(_))
    ));

    let err = quotes.delete(&f.staff, quote.id).await.unwrap_err();
    assert!(matches!(err, QuoteError::Invoiced(_)));
    assert!(matches!(AppError::from(err), AppError::InvalidState(_)));
    assert_eq!(quotes.get(quote.id).await.unwrap().status, QuoteStatus::Invoiced);
}

#[tokio::test]
async fn test_delete() {
    let f = fixture();
    let quotes = &f.services.quotes;
    let quote = quotes.create(&f.staff, new_quote(vec![item("A", dec!(1), 1)])).await.unwrap();

    quotes.delete(&f.staff, quote.id).await.unwrap();
    assert!(matches!(quotes.get(quote.id).await, Err(QuoteError::NotFound(_))));
    assert!(matches!(
        quotes.delete(&f.staff, QuoteId::new()).await,
        Err(QuoteError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_search_is_literal_and_case_insensitive() {
    let f = fixture();
    let quotes = &f.services.quotes;
    let mut input = new_quote(vec![item("A", dec!(1), 1)]);
    input.customer.company = Some("Acme (North)".to_string());
    quotes.create(&f.staff, input).await.unwrap();
    let mut other = new_quote(vec![item("B", dec!(1), 1)]);
    other.customer = customer("Bo Lind", "bo@example.com");
    quotes.create(&f.staff, other).await.unwrap();

    assert_eq!(quotes.search("ACME (n").await.unwrap().len(), 1);
    assert_eq!(quotes.search("example.com").await.unwrap().len(), 2);
    assert!(quotes.search(".*").await.unwrap().is_empty());
    assert!(matches!(quotes.search("  ").await, Err(QuoteError::BlankSearch)));
}

#[tokio::test]
async fn test_list_stats_and_paging() {
    let f = fixture();
    let quotes = &f.services.quotes;
    for price in [dec!(10), dec!(20), dec!(30)] {
        quotes.create(&f.staff, new_quote(vec![item("A", price, 1)])).await.unwrap();
    }
    let first = quotes.list(&QuoteFilter::default(), PageRequest::default()).await.unwrap();
    quotes.approve(&f.staff, first.data[0].id).await.unwrap();

    let page = quotes
        .list(
            &QuoteFilter::default(),
            PageRequest {
                page: 2,
                per_page: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.meta.total, 3);

    assert_eq!(quotes.list_by_status(QuoteStatus::Approved).await.unwrap().len(), 1);

    let stats = quotes.stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.total_amount, dec!(64.20));
    assert_eq!(stats.average_amount, dec!(21.40));
}
