//! Quote service.

use std::sync::Arc;

use chrono::Utc;
use tally_shared::types::{PageRequest, PageResponse, QuoteId};
use tracing::info;

use super::error::QuoteError;
use super::types::{
    Customer, NewQuote, Quote, QuoteDeletion, QuoteFilter, QuotePatch, QuoteStats, QuoteStatus,
};
use crate::auth::Actor;
use crate::billing::compute_totals;
use crate::numbering::{DocumentKind, NumberingAuthority};
use crate::settings::SettingsService;
use crate::store::QuoteStore;

/// Creates, edits and moves quotes through their lifecycle.
#[derive(Clone)]
pub struct QuoteService {
    quotes: Arc<dyn QuoteStore>,
    numbering: NumberingAuthority,
    settings: SettingsService,
}

impl std::fmt::Debug for QuoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteService").finish_non_exhaustive()
    }
}

impl QuoteService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        quotes: Arc<dyn QuoteStore>,
        numbering: NumberingAuthority,
        settings: SettingsService,
    ) -> Self {
        Self {
            quotes,
            numbering,
            settings,
        }
    }

    /// Creates a pending quote priced with the configured tax rate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCustomer` or `Billing` for bad input, `Store` if the
    /// number cannot be allocated or the quote cannot be saved.
    pub async fn create(&self, actor: &Actor, input: NewQuote) -> Result<Quote, QuoteError> {
        let customer = validate_customer(input.customer)?;
        let tax_rate = self.settings.tax_rate().await?;
        let totals = compute_totals(&input.items, tax_rate)?;
        let number = self.numbering.next_for_today(DocumentKind::Quote).await?;

        let now = Utc::now();
        let quote = Quote {
            id: QuoteId::new(),
            number: number.to_string(),
            customer,
            items: input.items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            status: QuoteStatus::Pending,
            created_by: actor.user_id,
            created_at: now,
            updated_at: now,
        };
        self.quotes.insert_quote(&quote).await?;

        info!(quote_id = %quote.id, number = %quote.number, total = %quote.total, "quote created");
        Ok(quote)
    }

    /// Loads a quote.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::NotFound` for unknown ids.
    pub async fn get(&self, id: QuoteId) -> Result<Quote, QuoteError> {
        self.quotes
            .get_quote(id)
            .await?
            .ok_or(QuoteError::NotFound(id))
    }

    /// Lists quotes matching the filter, newest first, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Store` if the store fails.
    pub async fn list(
        &self,
        filter: &QuoteFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Quote>, QuoteError> {
        let quotes = self.quotes.list_quotes(filter).await?;
        Ok(page.normalized().slice(quotes))
    }

    /// Lists every quote in one status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Store` if the store fails.
    pub async fn list_by_status(&self, status: QuoteStatus) -> Result<Vec<Quote>, QuoteError> {
        let filter = QuoteFilter {
            status: Some(status),
            ..QuoteFilter::default()
        };
        Ok(self.quotes.list_quotes(&filter).await?)
    }

    /// Applies a partial update.
    ///
    /// Customer fields are merged, totals are recomputed when items are
    /// given, and an optional status must be a legal manual transition.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Invoiced` for frozen quotes, `InvalidTransition`,
    /// validation errors, or `Conflict` if the quote changed concurrently.
    pub async fn update(
        &self,
        actor: &Actor,
        id: QuoteId,
        patch: QuotePatch,
    ) -> Result<Quote, QuoteError> {
        let current = self.get(id).await?;
        if current.status == QuoteStatus::Invoiced {
            return Err(QuoteError::Invoiced(id));
        }
        if patch.is_empty() {
            return Ok(current);
        }

        let expected = current.status;
        let mut quote = current;

        let customer = Customer {
            name: patch.name.unwrap_or(quote.customer.name),
            email: patch.email.unwrap_or(quote.customer.email),
            phone: patch.phone.unwrap_or(quote.customer.phone),
            company: patch.company.or(quote.customer.company),
            tax_id: patch.tax_id.or(quote.customer.tax_id),
        };
        quote.customer = validate_customer(customer)?;

        if let Some(items) = patch.items {
            let tax_rate = self.settings.tax_rate().await?;
            let totals = compute_totals(&items, tax_rate)?;
            quote.items = items;
            quote.set_totals(totals);
        }

        if let Some(target) = patch.status
            && target != expected
        {
            if !expected.can_transition_to(target) {
                return Err(QuoteError::InvalidTransition {
                    from: expected,
                    to: target,
                });
            }
            quote.status = target;
        }

        quote.updated_at = Utc::now();
        if !self.quotes.replace_quote(&quote, expected).await? {
            return Err(self.stale(id).await);
        }

        info!(quote_id = %id, user_id = %actor.user_id, status = %quote.status, "quote updated");
        Ok(quote)
    }

    /// Moves a pending quote to approved.
    ///
    /// # Errors
    ///
    /// See [`Self::update`].
    pub async fn approve(&self, actor: &Actor, id: QuoteId) -> Result<Quote, QuoteError> {
        self.transition(actor, id, QuoteStatus::Approved).await
    }

    /// Moves a pending quote to rejected.
    ///
    /// # Errors
    ///
    /// See [`Self::update`].
    pub async fn reject(&self, actor: &Actor, id: QuoteId) -> Result<Quote, QuoteError> {
        self.transition(actor, id, QuoteStatus::Rejected).await
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: QuoteId,
        target: QuoteStatus,
    ) -> Result<Quote, QuoteError> {
        let current = self.get(id).await?;
        if current.status == QuoteStatus::Invoiced {
            return Err(QuoteError::Invoiced(id));
        }
        if !current.status.can_transition_to(target) {
            return Err(QuoteError::InvalidTransition {
                from: current.status,
                to: target,
            });
        }
        let patch = QuotePatch {
            status: Some(target),
            ..QuotePatch::default()
        };
        self.update(actor, id, patch).await
    }

    /// Deletes a quote. Invoiced quotes are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Invoiced`.
    pub async fn delete(&self, actor: &Actor, id: QuoteId) -> Result<(), QuoteError> {
        match self.quotes.delete_quote(id).await? {
            QuoteDeletion::Deleted => {
                info!(quote_id = %id, user_id = %actor.user_id, "quote deleted");
                Ok(())
            }
            QuoteDeletion::NotFound => Err(QuoteError::NotFound(id)),
            QuoteDeletion::Invoiced => Err(QuoteError::Invoiced(id)),
        }
    }

    /// Case-insensitive literal search over number, customer name, company
    /// and email, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BlankSearch` for blank text.
    pub async fn search(&self, text: &str) -> Result<Vec<Quote>, QuoteError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QuoteError::BlankSearch);
        }
        Ok(self.quotes.search_quotes(text).await?)
    }

    /// Counts per status plus sum and average of totals.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Store` if the store fails.
    pub async fn stats(&self) -> Result<QuoteStats, QuoteError> {
        let quotes = self.quotes.list_quotes(&QuoteFilter::default()).await?;
        Ok(QuoteStats::from_quotes(&quotes))
    }

    async fn stale(&self, id: QuoteId) -> QuoteError {
        match self.quotes.get_quote(id).await {
            Ok(None) => QuoteError::NotFound(id),
            Ok(Some(q)) if q.status == QuoteStatus::Invoiced => QuoteError::Invoiced(id),
            Ok(Some(_)) => QuoteError::Conflict(id),
            Err(e) => e.into(),
        }
    }
}

fn validate_customer(customer: Customer) -> Result<Customer, QuoteError> {
    let customer = customer.normalized();
    let problems = customer.problems();
    if problems.is_empty() {
        Ok(customer)
    } else {
        Err(QuoteError::InvalidCustomer(problems.join("; ")))
    }
}
