//! Property-based tests for numbering.

use std::sync::Arc;

use proptest::prelude::*;

use super::service::NumberingAuthority;
use super::types::{DocumentKind, DocumentNumber};
use crate::store::memory::MemoryStore;

fn arb_kind() -> impl Strategy<Value = DocumentKind> {
    prop_oneof![Just(DocumentKind::Quote), Just(DocumentKind::Invoice)]
}

proptest! {
    /// Formatting then parsing yields the same number.
    #[test]
    fn prop_format_parse(kind in arb_kind(), year in 2000i32..2200, sequence in 1u32..100_000) {
        let number = DocumentNumber::new(kind, year, sequence);
        let parsed: DocumentNumber = number.to_string().parse().unwrap();
        prop_assert_eq!(parsed, number);
    }

    /// Sequential allocations within one (kind, year) increase by exactly one.
    #[test]
    fn prop_sequential_allocations(kind in arb_kind(), year in 2000i32..2200, count in 1usize..40) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let numbering = NumberingAuthority::new(Arc::new(MemoryStore::new()));

        let numbers: Vec<DocumentNumber> = runtime.block_on(async {
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(numbering.next_number(kind, year).await.unwrap());
            }
            out
        });

        for (i, number) in numbers.iter().enumerate() {
            prop_assert_eq!(number.sequence as usize, i + 1);
            prop_assert_eq!(number.year, year);
            prop_assert_eq!(number.kind, kind);
        }
    }
}
