//! Row ↔ domain conversions.
//!
//! Unknown enum names and undecodable JSON columns surface as
//! [`StoreError::Corrupt`] instead of being silently defaulted.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tally_core::auth::{User, UserRole};
use tally_core::invoice::{Invoice, InvoiceStatus};
use tally_core::journal::{EntryKind, EntryState, JournalEntry};
use tally_core::notification::{Notification, NotificationKind};
use tally_core::payment::{Payment, PaymentState};
use tally_core::quote::{Customer, Quote, QuoteStatus};
use tally_core::store::{StoreError, StoreResult};
use tally_shared::types::{InvoiceId, JournalEntryId, NotificationId, PaymentId, QuoteId, UserId};
use uuid::Uuid;

use crate::entities::{invoices, journal_entries, notifications, payments, quotes, users};

fn utc(at: DateTimeWithTimeZone) -> chrono::DateTime<Utc> {
    at.with_timezone(&Utc)
}

fn unknown(table: &str, id: Uuid, field: &str, value: &str) -> StoreError {
    StoreError::Corrupt(format!("{table} {id}: unknown {field} '{value}'"))
}

pub(crate) fn from_json<T: DeserializeOwned>(
    table: &str,
    id: Uuid,
    value: serde_json::Value,
) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|e| StoreError::Corrupt(format!("{table} {id}: {e}")))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> StoreResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Backend(e.to_string()))
}

// ========== Users ==========

pub(crate) fn user_from_row(row: users::Model) -> User {
    User {
        id: UserId::from_uuid(row.id),
        email: row.email,
        name: row.name,
        password_hash: row.password_hash,
        role: UserRole::parse(&row.role),
        active: row.active,
        created_at: utc(row.created_at),
        last_login_at: row.last_login_at.map(utc),
        reset_token_id: row.reset_token_id,
    }
}

pub(crate) fn user_to_row(user: &User) -> users::ActiveModel {
    users::ActiveModel {
        id: Set(user.id.into_inner()),
        email: Set(user.email.clone()),
        name: Set(user.name.clone()),
        password_hash: Set(user.password_hash.clone()),
        role: Set(user.role.as_str().to_string()),
        active: Set(user.active),
        created_at: Set(user.created_at.into()),
        last_login_at: Set(user.last_login_at.map(Into::into)),
        reset_token_id: Set(user.reset_token_id),
    }
}

// ========== Quotes ==========

pub(crate) fn quote_from_row(row: quotes::Model) -> StoreResult<Quote> {
    let status = QuoteStatus::parse(&row.status)
        .ok_or_else(|| unknown("quote", row.id, "status", &row.status))?;
    let items = from_json("quote", row.id, row.items)?;
    Ok(Quote {
        id: QuoteId::from_uuid(row.id),
        number: row.number,
        customer: Customer {
            name: row.customer_name,
            email: row.customer_email,
            phone: row.customer_phone,
            company: row.customer_company,
            tax_id: row.customer_tax_id,
        },
        items,
        subtotal: row.subtotal,
        tax: row.tax,
        total: row.total,
        status,
        created_by: UserId::from_uuid(row.created_by),
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

pub(crate) fn quote_to_row(quote: &Quote) -> StoreResult<quotes::ActiveModel> {
    Ok(quotes::ActiveModel {
        id: Set(quote.id.into_inner()),
        number: Set(quote.number.clone()),
        customer_name: Set(quote.customer.name.clone()),
        customer_email: Set(quote.customer.email.clone()),
        customer_phone: Set(quote.customer.phone.clone()),
        customer_company: Set(quote.customer.company.clone()),
        customer_tax_id: Set(quote.customer.tax_id.clone()),
        items: Set(to_json(&quote.items)?),
        subtotal: Set(quote.subtotal),
        tax: Set(quote.tax),
        total: Set(quote.total),
        status: Set(quote.status.as_str().to_string()),
        created_by: Set(quote.created_by.into_inner()),
        created_at: Set(quote.created_at.into()),
        updated_at: Set(quote.updated_at.into()),
    })
}

// ========== Invoices ==========

pub(crate) fn invoice_from_row(row: invoices::Model) -> StoreResult<Invoice> {
    let status = InvoiceStatus::parse(&row.status)
        .ok_or_else(|| unknown("invoice", row.id, "status", &row.status))?;
    let items = from_json("invoice", row.id, row.items)?;
    Ok(Invoice {
        id: InvoiceId::from_uuid(row.id),
        number: row.number,
        quote_id: QuoteId::from_uuid(row.quote_id),
        quote_number: row.quote_number,
        customer: Customer {
            name: row.customer_name,
            email: row.customer_email,
            phone: row.customer_phone,
            company: row.customer_company,
            tax_id: row.customer_tax_id,
        },
        items,
        subtotal: row.subtotal,
        tax: row.tax,
        total: row.total,
        amount_paid: row.amount_paid,
        status,
        payment_method: row.payment_method,
        paid_at: row.paid_at.map(utc),
        created_by: UserId::from_uuid(row.created_by),
        created_at: utc(row.created_at),
    })
}

pub(crate) fn invoice_to_row(invoice: &Invoice) -> StoreResult<invoices::ActiveModel> {
    Ok(invoices::ActiveModel {
        id: Set(invoice.id.into_inner()),
        number: Set(invoice.number.clone()),
        quote_id: Set(invoice.quote_id.into_inner()),
        quote_number: Set(invoice.quote_number.clone()),
        customer_name: Set(invoice.customer.name.clone()),
        customer_email: Set(invoice.customer.email.clone()),
        customer_phone: Set(invoice.customer.phone.clone()),
        customer_company: Set(invoice.customer.company.clone()),
        customer_tax_id: Set(invoice.customer.tax_id.clone()),
        items: Set(to_json(&invoice.items)?),
        subtotal: Set(invoice.subtotal),
        tax: Set(invoice.tax),
        total: Set(invoice.total),
        amount_paid: Set(invoice.amount_paid),
        status: Set(invoice.status.as_str().to_string()),
        payment_method: Set(invoice.payment_method.clone()),
        paid_at: Set(invoice.paid_at.map(Into::into)),
        created_by: Set(invoice.created_by.into_inner()),
        created_at: Set(invoice.created_at.into()),
    })
}

// ========== Payments ==========

pub(crate) fn payment_from_row(row: payments::Model) -> StoreResult<Payment> {
    let state = PaymentState::parse(&row.state)
        .ok_or_else(|| unknown("payment", row.id, "state", &row.state))?;
    Ok(Payment {
        id: PaymentId::from_uuid(row.id),
        invoice_id: InvoiceId::from_uuid(row.invoice_id),
        amount: row.amount,
        method: row.method,
        reference: row.reference,
        notes: row.notes,
        state,
        paid_at: utc(row.paid_at),
        confirmed_at: row.confirmed_at.map(utc),
        proof_file: row.proof_file,
        created_by: UserId::from_uuid(row.created_by),
        created_at: utc(row.created_at),
    })
}

pub(crate) fn payment_to_row(payment: &Payment) -> payments::ActiveModel {
    payments::ActiveModel {
        id: Set(payment.id.into_inner()),
        invoice_id: Set(payment.invoice_id.into_inner()),
        amount: Set(payment.amount),
        method: Set(payment.method.clone()),
        reference: Set(payment.reference.clone()),
        notes: Set(payment.notes.clone()),
        state: Set(payment.state.as_str().to_string()),
        paid_at: Set(payment.paid_at.into()),
        confirmed_at: Set(payment.confirmed_at.map(Into::into)),
        proof_file: Set(payment.proof_file.clone()),
        created_by: Set(payment.created_by.into_inner()),
        created_at: Set(payment.created_at.into()),
    }
}

// ========== Journal ==========

pub(crate) fn entry_from_row(row: journal_entries::Model) -> StoreResult<JournalEntry> {
    let kind = EntryKind::parse(&row.kind)
        .ok_or_else(|| unknown("journal entry", row.id, "kind", &row.kind))?;
    let state = EntryState::parse(&row.state)
        .ok_or_else(|| unknown("journal entry", row.id, "state", &row.state))?;
    let postings = from_json("journal entry", row.id, row.postings)?;
    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(row.id),
        date: utc(row.date),
        kind,
        description: row.description,
        reference: row.reference,
        postings,
        total: row.total,
        state,
        created_by: UserId::from_uuid(row.created_by),
        created_at: utc(row.created_at),
        confirmed_at: row.confirmed_at.map(utc),
    })
}

pub(crate) fn entry_to_row(entry: &JournalEntry) -> StoreResult<journal_entries::ActiveModel> {
    Ok(journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        date: Set(entry.date.into()),
        kind: Set(entry.kind.as_str().to_string()),
        description: Set(entry.description.clone()),
        reference: Set(entry.reference.clone()),
        postings: Set(to_json(&entry.postings)?),
        total: Set(entry.total),
        state: Set(entry.state.as_str().to_string()),
        created_by: Set(entry.created_by.into_inner()),
        created_at: Set(entry.created_at.into()),
        confirmed_at: Set(entry.confirmed_at.map(Into::into)),
    })
}

// ========== Notifications ==========

pub(crate) fn notification_from_row(row: notifications::Model) -> StoreResult<Notification> {
    let kind = NotificationKind::parse(&row.kind)
        .ok_or_else(|| unknown("notification", row.id, "kind", &row.kind))?;
    Ok(Notification {
        id: NotificationId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        kind,
        message: row.message,
        data: row.data,
        read: row.read,
        created_at: utc(row.created_at),
    })
}

pub(crate) fn notification_to_row(notification: &Notification) -> notifications::ActiveModel {
    notifications::ActiveModel {
        id: Set(notification.id.into_inner()),
        user_id: Set(notification.user_id.into_inner()),
        kind: Set(notification.kind.as_str().to_string()),
        message: Set(notification.message.clone()),
        data: Set(notification.data.clone()),
        read: Set(notification.read),
        created_at: Set(notification.created_at.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn quote_row(status: &str, items: serde_json::Value) -> quotes::Model {
        let now = Utc::now().into();
        quotes::Model {
            id: Uuid::new_v4(),
            number: "COT-2026-0001".to_string(),
            customer_name: "Ana Diaz".to_string(),
            customer_email: "ana@example.com".to_string(),
            customer_phone: "555-0100".to_string(),
            customer_company: None,
            customer_tax_id: None,
            items,
            subtotal: dec!(20.00),
            tax: dec!(1.40),
            total: dec!(21.40),
            status: status.to_string(),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_quote_row_decodes() {
        let row = quote_row(
            "approved",
            json!([{ "description": "Widget", "unitPrice": "10.00", "quantity": 2 }]),
        );
        let quote = quote_from_row(row).unwrap();
        assert_eq!(quote.status, QuoteStatus::Approved);
        assert_eq!(quote.items.len(), 1);
        assert_eq!(quote.items[0].line_total(), dec!(20.00));
        assert_eq!(quote.customer.name, "Ana Diaz");
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let row = quote_row("archived", json!([]));
        assert!(matches!(quote_from_row(row), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_bad_items_are_corrupt() {
        let row = quote_row("pending", json!({ "not": "a list" }));
        assert!(matches!(quote_from_row(row), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_unknown_role_is_least_privilege() {
        let row = users::Model {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            password_hash: "x".to_string(),
            role: "owner".to_string(),
            active: true,
            created_at: Utc::now().into(),
            last_login_at: None,
            reset_token_id: None,
        };
        assert_eq!(user_from_row(row).role, UserRole::User);
    }
}
