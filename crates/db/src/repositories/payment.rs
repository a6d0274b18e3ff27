//! Payment repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tally_core::journal::JournalEntry;
use tally_core::payment::{Payment, PaymentAdmission, PaymentFilter, PaymentState, admit_payment};
use tally_core::store::{ConfirmOutcome, PaymentStore, StoreResult};
use tally_shared::types::PaymentId;

use super::convert::{entry_to_row, payment_from_row, payment_to_row};
use super::invoice::payment_sum;
use super::{store_err, within_days};
use crate::entities::{invoices, payments};

/// Payments backed by the `payments` table.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, id: PaymentId) -> StoreResult<Option<Payment>> {
        payments::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(payment_from_row)
            .transpose()
    }
}

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn insert_payment_within_balance(
        &self,
        payment: &Payment,
        entry: &JournalEntry,
    ) -> StoreResult<PaymentAdmission> {
        let txn = self.db.begin().await.map_err(store_err)?;

        // The invoice row lock serializes admissions against the same invoice.
        let Some(invoice) = invoices::Entity::find_by_id(payment.invoice_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(store_err)?
        else {
            return Ok(PaymentAdmission::InvoiceMissing);
        };
        let recorded = payment_sum(&txn, invoice.id, None).await?;

        let admission = admit_payment(invoice.total, recorded, payment.amount);
        if admission == PaymentAdmission::Admitted {
            payment_to_row(payment)
                .insert(&txn)
                .await
                .map_err(store_err)?;
            entry_to_row(entry)?.insert(&txn).await.map_err(store_err)?;
            txn.commit().await.map_err(store_err)?;
        }
        Ok(admission)
    }

    async fn get_payment(&self, id: PaymentId) -> StoreResult<Option<Payment>> {
        self.find(id).await
    }

    async fn confirm_payment(
        &self,
        id: PaymentId,
        at: DateTime<Utc>,
    ) -> StoreResult<ConfirmOutcome<Payment>> {
        let confirmed_at: sea_orm::prelude::DateTimeWithTimeZone = at.into();
        let result = payments::Entity::update_many()
            .col_expr(payments::Column::State, Expr::value(PaymentState::Confirmed.as_str()))
            .col_expr(payments::Column::ConfirmedAt, Expr::value(confirmed_at))
            .filter(payments::Column::Id.eq(id.into_inner()))
            .filter(payments::Column::State.eq(PaymentState::Pending.as_str()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        Ok(match (result.rows_affected, self.find(id).await?) {
            (_, None) => ConfirmOutcome::NotFound,
            (0, Some(payment)) => ConfirmOutcome::AlreadyConfirmed(payment),
            (_, Some(payment)) => ConfirmOutcome::Confirmed(payment),
        })
    }

    async fn set_payment_proof(
        &self,
        id: PaymentId,
        stored_name: &str,
    ) -> StoreResult<Option<Payment>> {
        payments::Entity::update_many()
            .col_expr(payments::Column::ProofFile, Expr::value(stored_name))
            .filter(payments::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        self.find(id).await
    }

    async fn list_payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>> {
        let mut query = payments::Entity::find();
        if let Some(invoice_id) = filter.invoice_id {
            query = query.filter(payments::Column::InvoiceId.eq(invoice_id.into_inner()));
        }
        if let Some(state) = filter.state {
            query = query.filter(payments::Column::State.eq(state.as_str()));
        }
        let rows = within_days(query, payments::Column::PaidAt, filter.from, filter.to)
            .order_by_asc(payments::Column::PaidAt)
            .order_by_asc(payments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        rows.into_iter().map(payment_from_row).collect()
    }
}
