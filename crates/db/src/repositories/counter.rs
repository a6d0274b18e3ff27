//! Document counter repository.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use tally_core::numbering::DocumentKind;
use tally_core::store::{CounterStore, StoreError, StoreResult};

use super::store_err;

const INCREMENT_SQL: &str = r"
INSERT INTO document_counters (kind, year, value)
VALUES ($1, $2, 1)
ON CONFLICT (kind, year) DO UPDATE SET value = document_counters.value + 1
RETURNING value
";

/// Counters backed by `document_counters`, one row per (kind, year).
#[derive(Debug, Clone)]
pub struct CounterRepository {
    db: DatabaseConnection,
}

impl CounterRepository {
    /// Creates a new counter repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CounterStore for CounterRepository {
    async fn increment(&self, kind: DocumentKind, year: i32) -> StoreResult<u32> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            INCREMENT_SQL,
            [kind.as_str().into(), year.into()],
        );
        let row = self
            .db
            .query_one(stmt)
            .await
            .map_err(store_err)?
            .ok_or_else(|| StoreError::Backend("counter upsert returned no row".to_string()))?;
        let value: i32 = row.try_get("", "value").map_err(store_err)?;
        u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("counter value {value}")))
    }
}
