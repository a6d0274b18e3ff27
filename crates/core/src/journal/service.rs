//! Journal service.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tally_shared::types::JournalEntryId;
use tracing::{info, warn};

use super::aging::AgingReport;
use super::error::JournalError;
use super::statements::{
    AccountMovement, BalanceSheet, CashFlowStatement, IncomeStatement, account_movements,
    receivables_aging,
};
use super::types::{EntryDraft, EntryState, JournalEntry, JournalFilter};
use super::validation::validate_postings;
use crate::auth::Actor;
use crate::store::{ConfirmOutcome, JournalStore};

/// Posts, confirms and aggregates journal entries.
#[derive(Clone)]
pub struct Journal {
    store: Arc<dyn JournalStore>,
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal").finish_non_exhaustive()
    }
}

impl Journal {
    /// Creates the journal over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn JournalStore>) -> Self {
        Self { store }
    }

    // ========== Writes ==========

    /// Validates and stores a pending entry.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty, malformed or unbalanced
    /// postings, or a blank description.
    pub async fn post_entry(
        &self,
        actor: &Actor,
        draft: EntryDraft,
    ) -> Result<JournalEntry, JournalError> {
        let entry = Self::prepare_entry(actor, draft)?;
        self.store.insert_entry(&entry).await?;

        info!(
            entry_id = %entry.id,
            kind = entry.kind.as_str(),
            total = %entry.total,
            "journal entry posted"
        );
        Ok(entry)
    }

    /// Validates a draft and builds the pending entry without storing it.
    /// Used by callers that persist the entry together with their own rows.
    ///
    /// # Errors
    ///
    /// Same validation errors as [`Self::post_entry`].
    pub fn prepare_entry(actor: &Actor, draft: EntryDraft) -> Result<JournalEntry, JournalError> {
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(JournalError::BlankDescription);
        }
        let totals = validate_postings(&draft.postings)?;

        let now = Utc::now();
        Ok(JournalEntry {
            id: JournalEntryId::new(),
            date: draft.date.unwrap_or(now),
            kind: draft.kind,
            description: description.to_string(),
            reference: draft
                .reference
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            postings: draft.postings,
            total: totals.debit,
            state: EntryState::Pending,
            created_by: actor.user_id,
            created_at: now,
            confirmed_at: None,
        })
    }

    /// Confirms a pending entry. Confirming twice returns the entry
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `Unbalanced` if the stored postings no longer
    /// balance.
    pub async fn confirm(
        &self,
        actor: &Actor,
        id: JournalEntryId,
    ) -> Result<JournalEntry, JournalError> {
        let entry = self.get(id).await?;
        if entry.state == EntryState::Confirmed {
            return Ok(entry);
        }
        if let Err(e) = validate_postings(&entry.postings) {
            warn!(entry_id = %id, error = %e, "refusing to confirm invalid entry");
            return Err(e);
        }

        match self.store.confirm_entry(id, Utc::now()).await? {
            ConfirmOutcome::Confirmed(entry) => {
                info!(entry_id = %id, user_id = %actor.user_id, "journal entry confirmed");
                Ok(entry)
            }
            ConfirmOutcome::AlreadyConfirmed(entry) => Ok(entry),
            ConfirmOutcome::NotFound => Err(JournalError::NotFound(id)),
        }
    }

    // ========== Queries ==========

    /// Loads an entry.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::NotFound` for unknown ids.
    pub async fn get(&self, id: JournalEntryId) -> Result<JournalEntry, JournalError> {
        self.store
            .get_entry(id)
            .await?
            .ok_or(JournalError::NotFound(id))
    }

    /// Lists entries matching the filter, ordered by date.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a store failure.
    pub async fn list(&self, filter: &JournalFilter) -> Result<Vec<JournalEntry>, JournalError> {
        check_range(filter.from, filter.to)?;
        Ok(self.store.list_entries(filter).await?)
    }

    /// Entries carrying a given reference.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::Store` if the store fails.
    pub async fn by_reference(&self, reference: &str) -> Result<Vec<JournalEntry>, JournalError> {
        let filter = JournalFilter {
            reference: Some(reference.to_string()),
            ..JournalFilter::default()
        };
        Ok(self.store.list_entries(&filter).await?)
    }

    // ========== Statements ==========

    /// Per-account balances over confirmed entries dated up to `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::Store` if the store fails.
    pub async fn balance_sheet(&self, as_of: NaiveDate) -> Result<BalanceSheet, JournalError> {
        let entries = self.confirmed(None, Some(as_of)).await?;
        Ok(BalanceSheet::build(as_of, &entries))
    }

    /// Income and expense over confirmed entries in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a store failure.
    pub async fn income_statement(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<IncomeStatement, JournalError> {
        check_range(Some(start), Some(end))?;
        let entries = self.confirmed(Some(start), Some(end)).await?;
        Ok(IncomeStatement::build(start, end, &entries))
    }

    /// Cash movements over confirmed entries in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a store failure.
    pub async fn cash_flow(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<CashFlowStatement, JournalError> {
        check_range(Some(start), Some(end))?;
        let entries = self.confirmed(Some(start), Some(end)).await?;
        Ok(CashFlowStatement::build(start, end, &entries))
    }

    /// Ages confirmed receivable entries relative to `today`.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::Store` if the store fails.
    pub async fn receivables_aging(&self, today: NaiveDate) -> Result<AgingReport, JournalError> {
        let entries = self.confirmed(None, None).await?;
        Ok(receivables_aging(today, &entries))
    }

    /// Confirmed postings on one account in `[start, end]` with a running
    /// balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or a store failure.
    pub async fn account_movements(
        &self,
        account: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<AccountMovement>, JournalError> {
        check_range(start, end)?;
        let filter = JournalFilter {
            account: Some(account.to_string()),
            ..JournalFilter::confirmed_between(start, end)
        };
        let entries = self.store.list_entries(&filter).await?;
        Ok(account_movements(account, &entries))
    }

    async fn confirmed(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<JournalEntry>, JournalError> {
        Ok(self
            .store
            .list_entries(&JournalFilter::confirmed_between(from, to))
            .await?)
    }
}

fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), JournalError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(JournalError::InvalidDateRange),
        _ => Ok(()),
    }
}
