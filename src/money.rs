//! Conversions between decimal monetary amounts and their stored form.
//!
//! Amounts are stored as whole cents (`INTEGER` columns) so that balance
//! adjustments can be written as exact relative SQL updates. At the API
//! boundary amounts are [`Decimal`] values; anything with more than two
//! decimal places is rounded half-up on the way in (123.456 becomes 123.46).

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::Error;

/// Round `amount` to 2 decimal places (half-up) and convert it to cents.
///
/// # Errors
/// Returns [Error::InvalidAmount] if the rounded amount does not fit in an
/// `i64` number of cents.
pub fn to_cents(amount: Decimal) -> Result<i64, Error> {
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| Error::InvalidAmount(amount.to_string()))
}

/// Convert a stored number of cents back to a decimal amount with 2 decimal
/// places.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Format `cents` as a signed decimal amount with an explicit `+` on positive
/// values, e.g. `+123.45`.
pub(crate) fn format_signed(cents: i64) -> String {
    if cents >= 0 {
        format!("+{}", from_cents(cents))
    } else {
        from_cents(cents).to_string()
    }
}

#[cfg(test)]
mod money_tests {
    use rust_decimal::Decimal;

    use super::{format_signed, from_cents, to_cents};

    #[test]
    fn rounds_half_up_to_two_places() {
        let amount: Decimal = "123.456".parse().unwrap();

        assert_eq!(to_cents(amount), Ok(12346));
    }

    #[test]
    fn rounds_half_up_away_from_zero() {
        let amount: Decimal = "0.005".parse().unwrap();

        assert_eq!(to_cents(amount), Ok(1));
    }

    #[test]
    fn exact_amounts_are_unchanged() {
        let amount: Decimal = "100.50".parse().unwrap();

        assert_eq!(to_cents(amount), Ok(10050));
    }

    #[test]
    fn from_cents_restores_two_decimal_places() {
        assert_eq!(from_cents(12346).to_string(), "123.46");
        assert_eq!(from_cents(-5025).to_string(), "-50.25");
    }

    #[test]
    fn amounts_too_large_for_cents_are_rejected() {
        assert!(matches!(
            to_cents(Decimal::MAX),
            Err(crate::Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn round_trips_through_cents() {
        let amount: Decimal = "899.50".parse().unwrap();

        assert_eq!(from_cents(to_cents(amount).unwrap()), amount);
    }

    #[test]
    fn format_signed_includes_explicit_plus() {
        assert_eq!(format_signed(50000), "+500.00");
        assert_eq!(format_signed(-12345), "-123.45");
    }
}
