//! PostgreSQL implementations of the core store traits.
//!
//! Each repository wraps a [`DatabaseConnection`]. Operations the core
//! requires to be atomic run inside a transaction with the affected rows
//! locked, or as a single conditional statement.

mod convert;
mod counter;
mod invoice;
mod journal;
mod notification;
mod payment;
mod quote;
mod settings;
mod user;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::sea_query::IntoCondition;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, QueryFilter, SqlErr};
use tally_core::store::{StoreError, Stores};

pub use counter::CounterRepository;
pub use invoice::InvoiceRepository;
pub use journal::JournalRepository;
pub use notification::NotificationRepository;
pub use payment::PaymentRepository;
pub use quote::QuoteRepository;
pub use settings::SettingsRepository;
pub use user::UserRepository;

/// Builds every store on one connection pool.
#[must_use]
pub fn pg_stores(db: &DatabaseConnection) -> Stores {
    Stores {
        counters: Arc::new(CounterRepository::new(db.clone())),
        quotes: Arc::new(QuoteRepository::new(db.clone())),
        invoices: Arc::new(InvoiceRepository::new(db.clone())),
        payments: Arc::new(PaymentRepository::new(db.clone())),
        journal: Arc::new(JournalRepository::new(db.clone())),
        users: Arc::new(UserRepository::new(db.clone())),
        settings: Arc::new(SettingsRepository::new(db.clone())),
        notifications: Arc::new(NotificationRepository::new(db.clone())),
    }
}

/// Maps a database error onto the store error space.
pub(crate) fn store_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => StoreError::Conflict(msg),
        _ => StoreError::Backend(err.to_string()),
    }
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Restricts `column` to the calendar days `from..=to` (UTC).
pub(crate) fn within_days<Q, C>(
    mut query: Q,
    column: C,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Q
where
    Q: QueryFilter,
    C: ColumnTrait,
{
    if let Some(from) = from {
        query = query.filter(column.gte(day_start(from)).into_condition());
    }
    if let Some(to) = to {
        query = match to.succ_opt() {
            Some(next) => query.filter(column.lt(day_start(next)).into_condition()),
            None => query,
        };
    }
    query
}
