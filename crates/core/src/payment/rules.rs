//! Outstanding-balance rule shared by every store implementation.

use rust_decimal::Decimal;

/// Result of checking a new payment against its invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAdmission {
    /// The payment fits and was recorded.
    Admitted,
    /// The invoice does not exist.
    InvoiceMissing,
    /// The payment would exceed what is still owed.
    ExceedsOutstanding {
        /// Amount still owed before this payment.
        outstanding: Decimal,
    },
}

/// Invoice total minus every payment already recorded against it.
#[must_use]
pub fn outstanding_balance(total: Decimal, recorded: Decimal) -> Decimal {
    total - recorded
}

/// Decides whether a payment of `amount` fits.
///
/// `recorded` is the sum of all existing payments (pending and confirmed).
#[must_use]
pub fn admit_payment(total: Decimal, recorded: Decimal, amount: Decimal) -> PaymentAdmission {
    let outstanding = outstanding_balance(total, recorded);
    if amount > outstanding {
        PaymentAdmission::ExceedsOutstanding { outstanding }
    } else {
        PaymentAdmission::Admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exact_total_fits() {
        assert_eq!(
            admit_payment(dec!(100.00), Decimal::ZERO, dec!(100.00)),
            PaymentAdmission::Admitted
        );
    }

    #[test]
    fn test_one_cent_over_is_rejected() {
        assert_eq!(
            admit_payment(dec!(100.00), Decimal::ZERO, dec!(100.01)),
            PaymentAdmission::ExceedsOutstanding {
                outstanding: dec!(100.00)
            }
        );
        assert_eq!(
            admit_payment(dec!(100.00), dec!(100.00), dec!(0.01)),
            PaymentAdmission::ExceedsOutstanding {
                outstanding: Decimal::ZERO
            }
        );
    }

    proptest! {
        /// Admitted payments never push the recorded sum past the total.
        #[test]
        fn prop_admitted_never_exceeds_total(
            total_cents in 1i64..10_000_000,
            payments in prop::collection::vec(1i64..5_000_000, 1..30),
        ) {
            let total = Decimal::new(total_cents, 2);
            let mut recorded = Decimal::ZERO;
            for cents in payments {
                let amount = Decimal::new(cents, 2);
                if admit_payment(total, recorded, amount) == PaymentAdmission::Admitted {
                    recorded += amount;
                }
                prop_assert!(recorded <= total);
            }
        }
    }
}
