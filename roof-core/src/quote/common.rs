//! Money helpers shared by the quote calculator.

use rust_decimal::Decimal;

/// Rounds a decimal value to cents using half-up rounding.
///
/// Values at exactly half a cent round away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use roof_core::quote::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(657.3975)), dec!(657.40));
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a rate stored as a float setting into a [`Decimal`].
///
/// Returns `None` for NaN, infinities and negative rates.
pub fn rate_to_decimal(rate: f64) -> Option<Decimal> {
    if !rate.is_finite() || rate < 0.0 {
        return None;
    }
    Decimal::try_from(rate).ok()
}
