//! Property-based tests for line-item pricing.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::calculator::compute_totals;
use super::types::{DEFAULT_TAX_RATE, LineItem};

fn arb_item() -> impl Strategy<Value = LineItem> {
    (0i64..1_000_000, 1i32..500).prop_map(|(cents, quantity)| {
        LineItem::new("item", Decimal::new(cents, 2), quantity)
    })
}

proptest! {
    /// Subtotal is the exact sum of price × quantity.
    #[test]
    fn prop_subtotal_is_sum_of_lines(items in prop::collection::vec(arb_item(), 1..20)) {
        let totals = compute_totals(&items, DEFAULT_TAX_RATE).unwrap();
        let expected: Decimal = items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();
        prop_assert_eq!(totals.subtotal, expected);
    }

    /// Total equals subtotal × 1.07 within half a cent.
    #[test]
    fn prop_total_matches_rate(items in prop::collection::vec(arb_item(), 1..20)) {
        let totals = compute_totals(&items, DEFAULT_TAX_RATE).unwrap();
        let exact = totals.subtotal * dec!(1.07);
        prop_assert!((totals.total - exact).abs() <= dec!(0.005));
        prop_assert_eq!(totals.total, totals.subtotal + totals.tax);
    }

    /// Tax is never negative and never carries more than two decimals.
    #[test]
    fn prop_tax_in_cents(items in prop::collection::vec(arb_item(), 1..20)) {
        let totals = compute_totals(&items, DEFAULT_TAX_RATE).unwrap();
        prop_assert!(totals.tax >= Decimal::ZERO);
        prop_assert!(totals.tax.scale() <= 2);
    }
}
