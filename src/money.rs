// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Monetary Values
//!
//! Balances and transaction amounts are kept as integer minor units
//! (1/100 of the currency, "diram" for TJS). Decimal amounts only exist at the
//! API boundary.
//!
//! Conversion to minor units truncates toward zero: `1.999` becomes `199`.
//! Truncation is applied to the shortest decimal representation of the
//! incoming `f64`, so `0.29` is `29` and not `28`.

/// Currency label used in user-facing messages.
pub const CURRENCY: &str = "TJS";

/// Minor units per whole currency unit.
pub const MINOR_PER_UNIT: u64 = 100;

/// Errors converting a decimal amount into minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount is not a finite number")]
    NotFinite,

    #[error("amount is negative")]
    Negative,

    #[error("amount is too large")]
    OutOfRange,
}

/// Convert a decimal amount into minor units, truncating toward zero.
pub fn to_minor_units(amount: f64) -> Result<u64, MoneyError> {
    if !amount.is_finite() {
        return Err(MoneyError::NotFinite);
    }
    if amount < 0.0 {
        return Err(MoneyError::Negative);
    }
    if amount == 0.0 {
        return Ok(0);
    }

    // Display for f64 never uses exponent notation.
    let repr = amount.to_string();
    let (whole, fraction) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let whole: u64 = whole.parse().map_err(|_| MoneyError::OutOfRange)?;
    let cents = fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(2)
        .fold(0u64, |acc, digit| acc * 10 + u64::from(digit - b'0'));

    whole
        .checked_mul(MINOR_PER_UNIT)
        .and_then(|w| w.checked_add(cents))
        .ok_or(MoneyError::OutOfRange)
}

/// Convert minor units back into a decimal amount.
pub fn to_decimal(minor: u64) -> f64 {
    minor as f64 / MINOR_PER_UNIT as f64
}

/// Whole currency units, as shown in limit messages.
pub fn whole_units(minor: u64) -> u64 {
    minor / MINOR_PER_UNIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_whole_and_fractional_amounts() {
        assert_eq!(to_minor_units(4.0).unwrap(), 400);
        assert_eq!(to_minor_units(2.5).unwrap(), 250);
        assert_eq!(to_minor_units(0.29).unwrap(), 29);
        assert_eq!(to_minor_units(123.45).unwrap(), 12345);
    }

    #[test]
    fn truncates_instead_of_rounding() {
        assert_eq!(to_minor_units(1.999).unwrap(), 199);
        assert_eq!(to_minor_units(0.019).unwrap(), 1);
        assert_eq!(to_minor_units(0.001).unwrap(), 0);
    }

    #[test]
    fn rejects_unrepresentable_amounts() {
        assert_eq!(to_minor_units(f64::NAN), Err(MoneyError::NotFinite));
        assert_eq!(to_minor_units(f64::INFINITY), Err(MoneyError::NotFinite));
        assert_eq!(to_minor_units(-1.0), Err(MoneyError::Negative));
        assert_eq!(to_minor_units(1e30), Err(MoneyError::OutOfRange));
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(to_minor_units(-0.0).unwrap(), 0);
    }

    #[test]
    fn whole_cents_survive_a_round_trip() {
        for cents in (0..10_000u64).chain([123_456_789, 99_999_999_999]) {
            assert_eq!(to_minor_units(to_decimal(cents)).unwrap(), cents, "cents={cents}");
        }
    }

    #[test]
    fn whole_units_drops_cents() {
        assert_eq!(whole_units(1_000_099), 10_000);
    }
}
