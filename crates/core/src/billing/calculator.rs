//! Subtotal, tax and total computation.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::BillingError;
use super::types::{LineItem, Totals};

/// Number of decimal places kept on money amounts derived by multiplication.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a money column can hold (`NUMERIC(14,2)`).
pub const MAX_MONEY: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Returns true if `amount` has at most two decimals and fits a money column.
#[must_use]
pub fn is_money_amount(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE && amount.abs() <= MAX_MONEY
}

/// Rounds a derived money amount to cents using banker's rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns `sum / count` rounded to cents, or zero when `count` is zero.
#[must_use]
pub fn average(sum: Decimal, count: u64) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    round_money(sum / Decimal::from(count))
}

/// Returns `part / whole × 100` rounded to cents, or zero when `whole` is zero.
#[must_use]
pub fn percentage(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    round_money(Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole))
}

/// Validates line items without pricing them.
///
/// # Errors
///
/// Returns the first problem found, in item order.
pub fn validate_items(items: &[LineItem]) -> Result<(), BillingError> {
    if items.is_empty() {
        return Err(BillingError::NoItems);
    }
    for (index, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(BillingError::BlankDescription { index });
        }
        if item.quantity <= 0 {
            return Err(BillingError::NonPositiveQuantity { index });
        }
        if item.unit_price < Decimal::ZERO {
            return Err(BillingError::NegativePrice { index });
        }
        if !is_money_amount(item.unit_price) {
            return Err(BillingError::InvalidPrice { index });
        }
    }
    Ok(())
}

/// Computes subtotal, tax and total for a list of line items.
///
/// The subtotal is exact; tax is `subtotal × tax_rate` rounded to cents.
///
/// # Errors
///
/// Returns `BillingError` when the items are empty or malformed, when the
/// tax rate is outside `[0, 1]`, or when the total exceeds [`MAX_MONEY`].
pub fn compute_totals(items: &[LineItem], tax_rate: Decimal) -> Result<Totals, BillingError> {
    if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE {
        return Err(BillingError::InvalidTaxRate(tax_rate));
    }
    validate_items(items)?;

    let subtotal = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| {
            item.checked_line_total().and_then(|line| acc.checked_add(line))
        })
        .filter(|subtotal| *subtotal <= MAX_MONEY)
        .ok_or(BillingError::AmountTooLarge)?;
    let tax = subtotal
        .checked_mul(tax_rate)
        .map(round_money)
        .ok_or(BillingError::AmountTooLarge)?;
    let total = subtotal
        .checked_add(tax)
        .filter(|total| *total <= MAX_MONEY)
        .ok_or(BillingError::AmountTooLarge)?;

    Ok(Totals {
        subtotal,
        tax,
        total,
    })
}
