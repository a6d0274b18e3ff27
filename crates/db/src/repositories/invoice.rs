//! Invoice repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tally_core::invoice::{Invoice, InvoiceFilter, InvoiceStatus, QuoteConversion};
use tally_core::payment::PaymentState;
use tally_core::quote::QuoteStatus;
use tally_core::store::{InvoiceStore, StoreError, StoreResult};
use tally_shared::types::InvoiceId;
use uuid::Uuid;

use super::convert::{invoice_from_row, invoice_to_row};
use super::{store_err, within_days};
use crate::entities::{invoices, payments, quotes};

/// Invoices backed by the `invoices` table.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Sums every payment of `invoice_id`, optionally restricted to a state.
pub(crate) async fn payment_sum(
    txn: &DatabaseTransaction,
    invoice_id: Uuid,
    state: Option<PaymentState>,
) -> StoreResult<Decimal> {
    let mut query = payments::Entity::find()
        .select_only()
        .column(payments::Column::Amount)
        .filter(payments::Column::InvoiceId.eq(invoice_id));
    if let Some(state) = state {
        query = query.filter(payments::Column::State.eq(state.as_str()));
    }
    let amounts: Vec<Decimal> = query.into_tuple().all(txn).await.map_err(store_err)?;
    Ok(amounts.into_iter().sum())
}

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    async fn convert_quote(&self, invoice: &Invoice) -> StoreResult<QuoteConversion> {
        let txn = self.db.begin().await.map_err(store_err)?;

        let Some(quote) = quotes::Entity::find_by_id(invoice.quote_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(store_err)?
        else {
            return Ok(QuoteConversion::QuoteMissing);
        };
        let status = QuoteStatus::parse(&quote.status).ok_or_else(|| {
            StoreError::Corrupt(format!("quote {}: unknown status '{}'", quote.id, quote.status))
        })?;
        if status != QuoteStatus::Approved {
            return Ok(QuoteConversion::QuoteNotApproved(status));
        }

        quotes::Entity::update_many()
            .col_expr(quotes::Column::Status, Expr::value(QuoteStatus::Invoiced.as_str()))
            .col_expr(
                quotes::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(invoice.created_at)),
            )
            .filter(quotes::Column::Id.eq(quote.id))
            .exec(&txn)
            .await
            .map_err(store_err)?;
        invoice_to_row(invoice)?
            .insert(&txn)
            .await
            .map_err(store_err)?;

        txn.commit().await.map_err(store_err)?;
        Ok(QuoteConversion::Converted)
    }

    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        invoices::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(invoice_from_row)
            .transpose()
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> StoreResult<Vec<Invoice>> {
        let mut query = invoices::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(status.as_str()));
        }
        if filter.unpaid_only {
            query = query.filter(invoices::Column::Status.ne(InvoiceStatus::Paid.as_str()));
        }
        if let Some(email) = filter.customer_email.as_deref() {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(invoices::Column::CustomerEmail)))
                    .eq(email.trim().to_lowercase()),
            );
        }
        let rows = within_days(query, invoices::Column::CreatedAt, filter.from, filter.to)
            .order_by_desc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        rows.into_iter().map(invoice_from_row).collect()
    }

    async fn settle_invoice(
        &self,
        id: InvoiceId,
        method: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Invoice>> {
        let txn = self.db.begin().await.map_err(store_err)?;

        let Some(row) = invoices::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(store_err)?
        else {
            return Ok(None);
        };
        let confirmed = payment_sum(&txn, row.id, Some(PaymentState::Confirmed)).await?;

        let mut invoice = invoice_from_row(row)?;
        invoice.apply_settlement(confirmed, method, at);

        let mut update = invoice_to_row(&invoice)?;
        update.id = ActiveValue::Unchanged(invoice.id.into_inner());
        update.update(&txn).await.map_err(store_err)?;

        txn.commit().await.map_err(store_err)?;
        Ok(Some(invoice))
    }
}
