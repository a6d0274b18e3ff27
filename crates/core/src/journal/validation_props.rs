//! Property-based tests for posting validation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::JournalError;
use super::types::Posting;
use super::validation::validate_postings;

proptest! {
    /// Mirroring every debit with an equal credit always balances.
    #[test]
    fn prop_mirrored_postings_balance(amounts in prop::collection::vec(1i64..10_000_000, 1..15)) {
        let mut postings = Vec::new();
        for (i, cents) in amounts.iter().enumerate() {
            let amount = Decimal::new(*cents, 2);
            postings.push(Posting::debit(format!("asset_{i}"), amount));
            postings.push(Posting::credit(format!("source_{i}"), amount));
        }
        let totals = validate_postings(&postings).unwrap();
        let expected: Decimal = amounts.iter().map(|c| Decimal::new(*c, 2)).sum();
        prop_assert_eq!(totals.debit, expected);
        prop_assert_eq!(totals.credit, expected);
    }

    /// Any nonzero skew between the sides is rejected.
    #[test]
    fn prop_skewed_postings_rejected(cents in 2i64..10_000_000, skew in 1i64..1000) {
        prop_assume!(skew < cents);
        let postings = vec![
            Posting::debit("cash", Decimal::new(cents, 2)),
            Posting::credit("accounts_receivable", Decimal::new(cents - skew, 2)),
        ];
        let is_unbalanced = matches!(
            validate_postings(&postings),
            Err(JournalError::Unbalanced { .. })
        );
        prop_assert!(is_unbalanced);
    }
}
