//! Money representation and rounding.
//!
//! Money is an integer count of the smallest currency unit. Quantities that
//! are naturally fractional (sheet dimensions, percentages) are `Decimal`s and
//! are converted back to minor units exactly once, at the point a money value
//! is derived from them.

use rust_decimal::prelude::*;

use crate::error::{DomainError, DomainResult};

/// Non-negative money amount in minor units (e.g. cents).
pub type Amount = u64;

/// Money amount that may go negative (profit, margin).
pub type SignedAmount = i64;

/// Sum of many [`Amount`]s; wide enough that no realistic count of them overflows.
pub type AmountSum = u128;

/// Sum of many [`SignedAmount`]s.
pub type SignedAmountSum = i128;

/// Round a decimal money value to whole minor units (half away from zero).
pub fn round_minor(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a non-negative decimal money value to an [`Amount`].
pub fn to_amount(value: Decimal, field: &str) -> DomainResult<Amount> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::validation(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    round_minor(value)
        .to_u64()
        .ok_or_else(|| DomainError::validation(format!("{field} is out of range: {value}")))
}

/// Convert a signed decimal money value to a [`SignedAmount`].
pub fn to_signed_amount(value: Decimal, field: &str) -> DomainResult<SignedAmount> {
    round_minor(value)
        .to_i64()
        .ok_or_else(|| DomainError::validation(format!("{field} is out of range: {value}")))
}

/// `part / whole`, clamped to `[0, 1]`; zero when `whole` is zero.
pub fn ratio(part: Amount, whole: Amount) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    let r = Decimal::from(part) / Decimal::from(whole);
    r.min(Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(to_amount(dec!(2.5), "x").unwrap(), 3);
        assert_eq!(to_amount(dec!(2.49), "x").unwrap(), 2);
        assert_eq!(to_signed_amount(dec!(-2.5), "x").unwrap(), -3);
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(matches!(
            to_amount(dec!(-1), "discount"),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn ratio_is_clamped_and_safe_on_zero() {
        assert_eq!(ratio(50, 100), dec!(0.5));
        assert_eq!(ratio(150, 100), Decimal::ONE);
        assert_eq!(ratio(10, 0), Decimal::ZERO);
    }
}
