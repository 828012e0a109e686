//! Money helpers.
//!
//! All amounts are `rust_decimal::Decimal` in the store currency. Prices,
//! fees and shipping costs are rounded half-up at the cent.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Largest amount accepted from callers; the money columns are `NUMERIC(10, 2)`.
// `Decimal::new` is not `const`; these parts encode 9_999_999_999 with scale 2.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x540B_E3FF, 0x2, 0, false, 2);

/// Errors raised when reading an amount from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The text is not a decimal number.
    #[error("'{0}' is not a valid amount")]
    Invalid(String),

    /// The number is larger than any stored amount.
    #[error("'{0}' is too large")]
    TooLarge(String),
}

/// Round an amount to two decimal places, ties rounding towards positive
/// infinity (so `0.125` becomes `0.13` and `-0.125` becomes `-0.12`).
///
/// ```
/// use std::str::FromStr;
/// use rust_decimal::Decimal;
/// use emporium_core::round_cents;
///
/// let v = Decimal::from_str("44.985").unwrap();
/// assert_eq!(round_cents(v), Decimal::from_str("44.99").unwrap());
/// ```
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    let strategy = if amount.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    let mut rounded = amount.round_dp_with_strategy(2, strategy);
    rounded.rescale(2);
    rounded
}

/// Parse a decimal amount from a query-string value.
///
/// # Errors
///
/// Returns [`AmountError::Invalid`] when the trimmed text is not a number and
/// [`AmountError::TooLarge`] when its magnitude exceeds [`MAX_AMOUNT`].
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    let trimmed = raw.trim();
    let amount = trimmed
        .parse::<Decimal>()
        .map_err(|_| AmountError::Invalid(trimmed.to_owned()))?;
    if amount.abs() > MAX_AMOUNT {
        return Err(AmountError::TooLarge(trimmed.to_owned()));
    }
    Ok(amount)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_cents_half_up() {
        assert_eq!(round_cents(d("1.005")), d("1.01"));
        assert_eq!(round_cents(d("1.004")), d("1.00"));
        assert_eq!(round_cents(d("35.988")), d("35.99"));
    }

    #[test]
    fn test_round_cents_negative_ties_towards_positive() {
        assert_eq!(round_cents(d("-0.125")), d("-0.12"));
        assert_eq!(round_cents(d("-7.5")), d("-7.50"));
    }

    #[test]
    fn test_round_cents_keeps_two_places() {
        assert_eq!(round_cents(d("3")).to_string(), "3.00");
    }

    #[test]
    fn test_round_cents_does_not_overflow() {
        assert_eq!(round_cents(Decimal::MAX), Decimal::MAX);
        assert_eq!(round_cents(Decimal::MIN), Decimal::MIN);
    }

    #[test]
    fn test_max_amount_matches_column_range() {
        assert_eq!(MAX_AMOUNT, d("99999999.99"));
    }

    #[test]
    fn test_parse_amount_rejects_unstorable_values() {
        assert_eq!(parse_amount("99999999.99").unwrap(), MAX_AMOUNT);
        assert_eq!(
            parse_amount("50000000000000000000000000000").unwrap_err(),
            AmountError::TooLarge("50000000000000000000000000000".to_owned())
        );
        assert!(parse_amount("-100000000").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 250.5 ").unwrap(), d("250.5"));
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
    }
}
