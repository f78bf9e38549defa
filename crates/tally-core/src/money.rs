//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  The invoice printer and the checkout screen must agree to the cent,   │
//! │  so every amount in the cart is held as integer minor units.           │
//! │                                                                         │
//! │  All ratio math (VAT, percentage discounts/charges) rounds ONCE,       │
//! │  half-up (away from zero), at 2 decimals.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let doubled = price * 2;             // 21.98
//! let total = price + Money::from_cents(500);
//! assert_eq!(total.cents(), 1599);
//! assert_eq!(doubled.to_string(), "21.98");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts and refunds can be negative intermediates
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as a bare integer**: snapshots store cents, never floats
/// - **Operators saturate**: totals stay displayable even for a restored
///   snapshot nobody validated; use `checked_*` to reject instead
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  keypad / price string ──► LineItem.unit_price ──► LineItem.total       │
/// │                                                        │                │
/// │                                                        ▼                │
/// │  Discount / Charge ──────────────────────────► CartTotals.total_amount │
/// │                                                        │                │
/// │                                                        ▼                │
/// │                              Tender.amount ──► change_due / balance_due │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Returns zero for negative values.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let line_total = Money::from_cents(299).multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `self × rate`, rounded half-up to the cent.
    ///
    /// This is the single primitive behind exclusive VAT, percentage
    /// discounts and percentage charges.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::Rate;
    ///
    /// // 10.00 × 8.25% = 0.825 → 0.83
    /// let vat = Money::from_cents(1000).percent_of(Rate::from_bps(825));
    /// assert_eq!(vat.cents(), 83);
    /// ```
    pub fn percent_of(&self, rate: Rate) -> Money {
        self.mul_div(rate.bps() as i64, Rate::ONE_HUNDRED_PERCENT_BPS as i64)
    }

    /// Returns `self × numerator / denominator`, rounded half-up.
    ///
    /// Uses i128 internally; a result outside i64 saturates. A zero
    /// denominator yields zero rather than panicking.
    pub fn mul_div(&self, numerator: i64, denominator: i64) -> Money {
        if denominator == 0 {
            return Money::zero();
        }
        let product = self.0 as i128 * numerator as i128;
        let quotient = div_round_half_up(product, denominator as i128);
        match i64::try_from(quotient) {
            Ok(cents) => Money(cents),
            Err(_) if quotient < 0 => Money(i64::MIN),
            Err(_) => Money(i64::MAX),
        }
    }

    /// `self + other`, or `None` if the result does not fit.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self × qty`, or `None` if the result does not fit.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

}

/// Integer division rounding half away from zero.
///
/// `div_round_half_up(5, 2) == 3`, `div_round_half_up(-5, 2) == -3`.
pub(crate) fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    let (n, d) = if denominator < 0 {
        (-numerator, -denominator)
    } else {
        (numerator, denominator)
    };
    if n >= 0 {
        (2 * n + d) / (2 * d)
    } else {
        -((-2 * n + d) / (2 * d))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain `major.minor` rendering without a currency symbol.
///
/// Currency symbols are a store setting; see the session crate's
/// `CurrencySettings::format`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_sum() {
        let amounts = vec![Money::from_cents(100), Money::from_cents(250)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.cents(), 350);
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // 10.00 at 8.25% = 0.825 → 0.83
        assert_eq!(Money::from_cents(1000).percent_of(Rate::from_bps(825)).cents(), 83);
        // 0.10 at 5% = 0.005 → 0.01 (half goes up, not to even)
        assert_eq!(Money::from_cents(10).percent_of(Rate::from_bps(500)).cents(), 1);
        // 0.30 at 5% = 0.015 → 0.02
        assert_eq!(Money::from_cents(30).percent_of(Rate::from_bps(500)).cents(), 2);
    }

    #[test]
    fn test_mul_div_negative_rounds_away_from_zero() {
        assert_eq!(Money::from_cents(-10).mul_div(1, 4).cents(), -3);
        assert_eq!(Money::from_cents(10).mul_div(1, 4).cents(), 3);
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        assert_eq!(Money::from_cents(1000).mul_div(3, 0), Money::zero());
    }

    #[test]
    fn test_div_round_half_up() {
        assert_eq!(div_round_half_up(5, 2), 3);
        assert_eq!(div_round_half_up(4, 3), 1);
        assert_eq!(div_round_half_up(-5, 2), -3);
        assert_eq!(div_round_half_up(5, -2), -3);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
        assert_eq!(Money::from_cents(-100).non_negative(), Money::zero());
        assert_eq!(Money::from_cents(100).abs().cents(), 100);
    }

    #[test]
    fn test_ord_min_max() {
        let a = Money::from_cents(100);
        let b = Money::from_cents(200);
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
    }

    #[test]
    fn test_overflow_saturates_or_reports() {
        let huge = Money::from_cents(5_000_000_000_000_000_000);
        assert_eq!(huge.checked_mul(2), None);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(huge.checked_mul(1), Some(huge));

        assert_eq!((huge * 2).cents(), i64::MAX);
        assert_eq!(huge.multiply_quantity(-2).cents(), i64::MIN);
        assert_eq!([huge, huge].iter().sum::<Money>().cents(), i64::MAX);
        assert_eq!(huge.mul_div(3, 1).cents(), i64::MAX);
        assert_eq!((-huge).mul_div(3, 1).cents(), i64::MIN);
    }

    #[test]
    fn test_serializes_as_bare_cents() {
        let json = serde_json::to_string(&Money::from_cents(1550)).unwrap();
        assert_eq!(json, "1550");
    }
}
