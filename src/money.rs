//! Fixed-point monetary amounts.
//!
//! Amounts are kept as exact decimals so that `100.00 * 0.065` is `6.5` and
//! not a binary-float approximation. Rounding to two places is a display
//! concern ([`Money::format_currency`]); persisted values keep full precision.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

/// A monetary amount with fixed-point semantics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Build an amount from an integer count of cents.
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Parse a persisted amount, defaulting to zero when it is not numeric.
    ///
    /// Accepts scientific notation since older files were written by a
    /// runtime that renders large doubles as `1.0E7`.
    pub fn parse_or_zero(raw: &str) -> Money {
        match Money::from_str(raw) {
            Ok(money) => money,
            Err(_) => {
                warn!("Non-numeric amount '{}' defaulted to 0", raw);
                Money::ZERO
            }
        }
    }

    /// `self + rhs`, or `None` if the result does not fit.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// `self * factor`, or `None` if the result does not fit.
    pub fn checked_mul(self, factor: Decimal) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    /// Number of whole `unit`s in this amount, floored. Negative amounts
    /// and non-positive units yield zero; quotients too large to count
    /// saturate.
    pub fn floor_div(&self, unit: Money) -> u32 {
        if unit.0 <= Decimal::ZERO || self.is_negative() {
            return 0;
        }
        match self.0.checked_div(unit.0) {
            Some(quotient) => quotient.floor().to_u32().unwrap_or(u32::MAX),
            None => u32::MAX,
        }
    }

    /// Render with exactly two decimals, e.g. `$17.00`.
    pub fn format_currency(&self) -> String {
        format!("${:.2}", self.0.round_dp(2))
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Money)
    }
}

/// Persisted rendering: normalized, always with a fractional digit
/// (`100` -> `100.0`, `6.500` -> `6.5`).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let normalized = self.0.normalize();
        if normalized.scale() == 0 {
            write!(f, "{}.0", normalized)
        } else {
            write!(f, "{}", normalized)
        }
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn test_display_keeps_fraction_digit() {
        assert_eq!(money("100").to_string(), "100.0");
        assert_eq!(money("6.500").to_string(), "6.5");
        assert_eq!(money("106.50").to_string(), "106.5");
        assert_eq!(money("0").to_string(), "0.0");
    }

    #[test]
    fn test_tax_is_exact() {
        let tax = money("100.00")
            .checked_mul(Decimal::from_str("0.065").unwrap())
            .unwrap();
        assert_eq!(tax, money("6.5"));
    }

    #[test]
    fn test_parse_or_zero() {
        assert_eq!(Money::parse_or_zero("12.25"), money("12.25"));
        assert_eq!(Money::parse_or_zero("abc"), Money::ZERO);
        assert_eq!(Money::parse_or_zero(""), Money::ZERO);
        assert_eq!(Money::parse_or_zero("1.0E7"), money("10000000"));
    }

    #[test]
    fn test_floor_div() {
        assert_eq!(money("106.50").floor_div(money("10")), 10);
        assert_eq!(money("9.99").floor_div(money("10")), 0);
        assert_eq!(money("-5").floor_div(money("10")), 0);
        assert_eq!(money("5").floor_div(Money::ZERO), 0);
        assert_eq!(money("5").floor_div(money("-1")), 0);
        assert_eq!(money("1.0E28").floor_div(money("0.0000001")), u32::MAX);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(money("17").format_currency(), "$17.00");
        assert_eq!(money("6.505").format_currency(), "$6.50");
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Money::parse_or_zero("1.0E28");
        assert_eq!(huge.checked_mul(Decimal::from(9)), None);
        assert_eq!(huge.checked_add(huge), Some(money("2.0E28")));
        assert_eq!(money("5.0E28").checked_add(money("5.0E28")), None);
        assert_eq!(
            money("1.5").checked_add(money("2.25")),
            Some(money("3.75"))
        );
    }
}
