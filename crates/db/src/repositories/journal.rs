//! Journal entry repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tally_core::journal::{EntryState, JournalEntry, JournalFilter};
use tally_core::store::{ConfirmOutcome, JournalStore, StoreResult};
use tally_shared::types::JournalEntryId;

use super::convert::{entry_from_row, entry_to_row};
use super::{store_err, within_days};
use crate::entities::journal_entries;

/// Journal entries backed by `journal_entries`; postings live in a JSONB column.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, id: JournalEntryId) -> StoreResult<Option<JournalEntry>> {
        journal_entries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(entry_from_row)
            .transpose()
    }
}

#[async_trait]
impl JournalStore for JournalRepository {
    async fn insert_entry(&self, entry: &JournalEntry) -> StoreResult<()> {
        entry_to_row(entry)?
            .insert(&self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn get_entry(&self, id: JournalEntryId) -> StoreResult<Option<JournalEntry>> {
        self.find(id).await
    }

    async fn confirm_entry(
        &self,
        id: JournalEntryId,
        at: DateTime<Utc>,
    ) -> StoreResult<ConfirmOutcome<JournalEntry>> {
        let confirmed_at: sea_orm::prelude::DateTimeWithTimeZone = at.into();
        let result = journal_entries::Entity::update_many()
            .col_expr(
                journal_entries::Column::State,
                Expr::value(EntryState::Confirmed.as_str()),
            )
            .col_expr(journal_entries::Column::ConfirmedAt, Expr::value(confirmed_at))
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::State.eq(EntryState::Pending.as_str()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        Ok(match (result.rows_affected, self.find(id).await?) {
            (_, None) => ConfirmOutcome::NotFound,
            (0, Some(entry)) => ConfirmOutcome::AlreadyConfirmed(entry),
            (_, Some(entry)) => ConfirmOutcome::Confirmed(entry),
        })
    }

    async fn list_entries(&self, filter: &JournalFilter) -> StoreResult<Vec<JournalEntry>> {
        let mut query = journal_entries::Entity::find();
        if let Some(state) = filter.state {
            query = query.filter(journal_entries::Column::State.eq(state.as_str()));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(journal_entries::Column::Kind.eq(kind.as_str()));
        }
        if let Some(reference) = filter.reference.as_deref() {
            query = query.filter(journal_entries::Column::Reference.eq(reference));
        }
        let rows = within_days(query, journal_entries::Column::Date, filter.from, filter.to)
            .order_by_asc(journal_entries::Column::Date)
            .order_by_asc(journal_entries::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?;

        // Postings are JSONB, so the account filter runs on decoded entries.
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let entry = entry_from_row(row)?;
            if filter.matches(&entry) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}
