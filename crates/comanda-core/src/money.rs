//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Pesos?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In JavaScript/floating point:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  OUR SOLUTION: integer minor units (Chilean pesos)                  │
//! │    Every amount is an i64 number of pesos.                          │
//! │    Tips and till totals round to the nearest hundred pesos,         │
//! │    with explicit round-half-up rules that must be bit-exact         │
//! │    across every station.                                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::money::Money;
//!
//! let total = Money::from_minor(12345);
//!
//! // 10% tip, rounded half-up on the real-valued product
//! assert_eq!(total.percent_of(10).minor(), 1235);
//!
//! // Nearest hundred, ties up
//! assert_eq!(total.percent_of(10).round_to_hundred().minor(), 1200);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate subtractions may dip negative before
///   being clamped (change/shortfall)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Computes `self × pct / 100`, rounding half-up on the real-valued
    /// product.
    ///
    /// This is the exact-tip rule: the product `amount × pct` is an
    /// integer, and the division by 100 rounds ties away from zero
    /// toward +∞ (the behavior of `Math.round` on the wire-compatible
    /// frontends).
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// // 12345 × 10% = 1234.5 → 1235
    /// assert_eq!(Money::from_minor(12345).percent_of(10).minor(), 1235);
    /// ```
    pub fn percent_of(&self, pct: u8) -> Money {
        // i128 to prevent overflow on large amounts
        let product = self.0 as i128 * pct as i128;
        Money::from_minor((product + 50).div_euclid(100) as i64)
    }

    /// Rounds to the nearest multiple of 100 minor units, ties up.
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(1235).round_to_hundred().minor(), 1200);
    /// assert_eq!(Money::from_minor(1250).round_to_hundred().minor(), 1300);
    /// assert_eq!(Money::from_minor(13580).round_to_hundred().minor(), 13600);
    /// ```
    pub fn round_to_hundred(&self) -> Money {
        Money::from_minor((self.0 + 50).div_euclid(100) * 100)
    }

    /// Returns `max(self - other, 0)`.
    ///
    /// Change and shortfall are both one-sided differences; a negative
    /// result means "the other side owes" and is reported as zero here.
    #[inline]
    pub fn excess_over(&self, other: Money) -> Money {
        Money::from_minor((self.0 - other.0).max(0))
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money the way the tills print it:
/// `$` sign and dot thousands separators, no decimals (`$12.345`).
///
/// ## Note
/// This is for logs and terminal display. Frontends format for
/// localization themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        write!(f, "{}${}", sign, grouped)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(12345);
        assert_eq!(money.minor(), 12345);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(format!("{}", Money::from_minor(12345)), "$12.345");
        assert_eq!(format!("{}", Money::from_minor(500)), "$500");
        assert_eq!(format!("{}", Money::from_minor(1234567)), "$1.234.567");
        assert_eq!(format!("{}", Money::from_minor(0)), "$0");
        assert_eq!(format!("{}", Money::from_minor(-5500)), "-$5.500");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        let result: Money = a * 3;
        assert_eq!(result.minor(), 3000);
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // 12345 × 10% = 1234.5 → 1235
        assert_eq!(Money::from_minor(12345).percent_of(10).minor(), 1235);
        // 8000 × 15% = 1200 exactly
        assert_eq!(Money::from_minor(8000).percent_of(15).minor(), 1200);
        // 0% tip is always zero
        assert_eq!(Money::from_minor(99999).percent_of(0).minor(), 0);
        // 100% is identity
        assert_eq!(Money::from_minor(4321).percent_of(100).minor(), 4321);
    }

    #[test]
    fn test_round_to_hundred_ties_up() {
        assert_eq!(Money::from_minor(1249).round_to_hundred().minor(), 1200);
        assert_eq!(Money::from_minor(1250).round_to_hundred().minor(), 1300);
        assert_eq!(Money::from_minor(1235).round_to_hundred().minor(), 1200);
        assert_eq!(Money::from_minor(13580).round_to_hundred().minor(), 13600);
        assert_eq!(Money::from_minor(0).round_to_hundred().minor(), 0);
    }

    #[test]
    fn test_excess_over_clamps_at_zero() {
        let due = Money::from_minor(10000);
        let tendered = Money::from_minor(9000);

        assert_eq!(tendered.excess_over(due).minor(), 0); // change
        assert_eq!(due.excess_over(tendered).minor(), 1000); // shortfall

        let generous = Money::from_minor(20000);
        assert_eq!(generous.excess_over(due).minor(), 10000);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_minor(100);
        assert!(positive.is_positive());

        let negative = Money::from_minor(-100);
        assert!(negative.is_negative());
    }
}
