//! Balance validation for journal postings.

use rust_decimal::Decimal;

use crate::billing::{MAX_MONEY, is_money_amount};

use super::error::JournalError;
use super::types::{Posting, Side};

/// Debit and credit sums of a posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingTotals {
    /// Sum of debit postings.
    pub debit: Decimal,
    /// Sum of credit postings.
    pub credit: Decimal,
}

impl PostingTotals {
    /// Sums postings by side without validating them. Returns `None` if a
    /// side overflows.
    #[must_use]
    pub fn of(postings: &[Posting]) -> Option<Self> {
        postings.iter().try_fold(
            Self {
                debit: Decimal::ZERO,
                credit: Decimal::ZERO,
            },
            |mut acc, p| {
                match p.side {
                    Side::Debit => acc.debit = acc.debit.checked_add(p.amount)?,
                    Side::Credit => acc.credit = acc.credit.checked_add(p.amount)?,
                }
                Some(acc)
            },
        )
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }
}

/// Validates postings and returns their totals.
///
/// # Errors
///
/// - `JournalError::NoPostings` for an empty list
/// - `JournalError::BlankAccount` for a posting without an account
/// - `JournalError::NonPositiveAmount` for an amount of zero or less
/// - `JournalError::InvalidAmount` for sub-cent or oversized amounts
/// - `JournalError::AmountTooLarge` when a side sums past the money limit
/// - `JournalError::Unbalanced` when Σdebit ≠ Σcredit
pub fn validate_postings(postings: &[Posting]) -> Result<PostingTotals, JournalError> {
    if postings.is_empty() {
        return Err(JournalError::NoPostings);
    }

    for (index, posting) in postings.iter().enumerate() {
        if posting.account.trim().is_empty() {
            return Err(JournalError::BlankAccount { index });
        }
        if posting.amount <= Decimal::ZERO {
            return Err(JournalError::NonPositiveAmount { index });
        }
        if !is_money_amount(posting.amount) {
            return Err(JournalError::InvalidAmount { index });
        }
    }

    let totals = PostingTotals::of(postings)
        .filter(|t| t.debit <= MAX_MONEY && t.credit <= MAX_MONEY)
        .ok_or(JournalError::AmountTooLarge)?;
    if !totals.is_balanced() {
        return Err(JournalError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balanced() {
        let postings = vec![
            Posting::debit("cash", dec!(21.40)),
            Posting::credit("accounts_receivable", dec!(21.40)),
        ];
        let totals = validate_postings(&postings).unwrap();
        assert_eq!(totals.debit, dec!(21.40));
    }

    #[test]
    fn test_split_credit_is_balanced() {
        let postings = vec![
            Posting::debit("cash", dec!(100)),
            Posting::credit("sales", dec!(93.46)),
            Posting::credit("tax_payable", dec!(6.54)),
        ];
        assert!(validate_postings(&postings).is_ok());
    }

    #[test]
    fn test_unbalanced() {
        let postings = vec![
            Posting::debit("cash", dec!(10)),
            Posting::credit("accounts_receivable", dec!(9.99)),
        ];
        let err = validate_postings(&postings).unwrap_err();
        assert!(matches!(err, JournalError::Unbalanced { .. }));
        assert_eq!(err.to_string(), "unbalanced entry: debit 10 != credit 9.99");
    }

    #[test]
    fn test_empty() {
        assert!(matches!(validate_postings(&[]), Err(JournalError::NoPostings)));
    }

    #[test]
    fn test_zero_amount() {
        let postings = vec![Posting::debit("cash", dec!(0)), Posting::credit("x", dec!(0))];
        assert!(matches!(
            validate_postings(&postings),
            Err(JournalError::NonPositiveAmount { index: 0 })
        ));
    }

    #[test]
    fn test_sub_cent_amount() {
        let postings = vec![
            Posting::debit("cash", dec!(0.004)),
            Posting::credit("x", dec!(0.004)),
        ];
        assert!(matches!(
            validate_postings(&postings),
            Err(JournalError::InvalidAmount { index: 0 })
        ));
    }

    #[test]
    fn test_huge_amounts_are_rejected_not_panicking() {
        let huge = dec!(40000000000000000000000000000);
        let postings = vec![
            Posting::debit("cash", huge),
            Posting::debit("bank", huge),
            Posting::credit("x", huge),
            Posting::credit("y", huge),
        ];
        assert!(PostingTotals::of(&postings).is_none());
        assert!(matches!(
            validate_postings(&postings),
            Err(JournalError::InvalidAmount { index: 0 })
        ));
    }

    #[test]
    fn test_side_sum_above_limit() {
        let max = dec!(999999999999.99);
        let postings = vec![
            Posting::debit("cash", max),
            Posting::debit("bank", max),
            Posting::credit("x", max),
            Posting::credit("y", max),
        ];
        assert!(matches!(
            validate_postings(&postings),
            Err(JournalError::AmountTooLarge)
        ));
    }

    #[test]
    fn test_blank_account() {
        let postings = vec![Posting::debit(" ", dec!(1)), Posting::credit("x", dec!(1))];
        assert!(matches!(
            validate_postings(&postings),
            Err(JournalError::BlankAccount { index: 0 })
        ));
    }
}
