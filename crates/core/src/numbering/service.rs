//! Number allocation.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::debug;

use super::types::{DocumentKind, DocumentNumber};
use crate::store::{CounterStore, StoreError};

/// Allocates unique document numbers.
#[derive(Clone)]
pub struct NumberingAuthority {
    counters: Arc<dyn CounterStore>,
}

impl std::fmt::Debug for NumberingAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumberingAuthority").finish_non_exhaustive()
    }
}

impl NumberingAuthority {
    /// Creates a numbering authority over the given counter store.
    #[must_use]
    pub fn new(counters: Arc<dyn CounterStore>) -> Self {
        Self { counters }
    }

    /// Allocates the next number for `kind` in `year`.
    ///
    /// A number is consumed even if the caller later fails to store the
    /// document; gaps are possible, duplicates are not.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the counter cannot be incremented.
    pub async fn next_number(
        &self,
        kind: DocumentKind,
        year: i32,
    ) -> Result<DocumentNumber, StoreError> {
        let sequence = self.counters.increment(kind, year).await?;
        let number = DocumentNumber::new(kind, year, sequence);
        debug!(number = %number, "allocated document number");
        Ok(number)
    }

    /// Allocates the next number for `kind` in the current UTC year.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the counter cannot be incremented.
    pub async fn next_for_today(&self, kind: DocumentKind) -> Result<DocumentNumber, StoreError> {
        self.next_number(kind, Utc::now().year()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn authority() -> NumberingAuthority {
        NumberingAuthority::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_sequences_start_at_one() {
        let numbering = authority();
        let first = numbering.next_number(DocumentKind::Quote, 2026).await.unwrap();
        assert_eq!(first.to_string(), "COT-2026-0001");
    }

    #[tokio::test]
    async fn test_sequences_are_independent_per_kind_and_year() {
        let numbering = authority();
        numbering.next_number(DocumentKind::Quote, 2026).await.unwrap();
        numbering.next_number(DocumentKind::Quote, 2026).await.unwrap();

        let invoice = numbering.next_number(DocumentKind::Invoice, 2026).await.unwrap();
        let next_year = numbering.next_number(DocumentKind::Quote, 2027).await.unwrap();

        assert_eq!(invoice.to_string(), "FAC-2026-0001");
        assert_eq!(next_year.to_string(), "COT-2027-0001");
    }

    #[tokio::test]
    async fn test_concurrent_allocation_is_unique() {
        let numbering = authority();
        let mut handles = Vec::new();
        for _ in 0..50 {
            let numbering = numbering.clone();
            handles.push(tokio::spawn(async move {
                numbering
                    .next_number(DocumentKind::Invoice, 2026)
                    .await
                    .unwrap()
                    .sequence
            }));
        }

        let mut sequences = Vec::new();
        for handle in handles {
            sequences.push(handle.await.unwrap());
        }
        sequences.sort_unstable();
        assert_eq!(sequences, (1..=50).collect::<Vec<u32>>());
    }
}
