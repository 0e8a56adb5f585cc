//! # Money Module
//!
//! Integer rupiah amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rupiah has no minor unit in day-to-day retail: prices, totals and      │
//! │  discounts are whole rupiah. Storing them as i64 keeps sums exact.      │
//! │                                                                         │
//! │  The only float in the pipeline is the sold quantity (2.35 kg):         │
//! │                                                                         │
//! │    12.500 × 2.35 = 29.375,0000001  ──round──►  Rp 29.375                │
//! │                                                                         │
//! │  Rounding happens once, per line, in `line_total`.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use warung_core::money::Money;
//!
//! let price = Money::from_rupiah(10_000);
//! let total = price * 3 + Money::from_rupiah(2_500);
//! assert_eq!(total.rupiah(), 32_500);
//! assert_eq!(total.to_string(), "Rp 32.500");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// A monetary value in whole rupiah.
///
/// Signed, so refunds and discounts can be represented as negatives.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_rupiah(rupiah: i64) -> Self {
        Money(rupiah)
    }

    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Price of a possibly fractional quantity, rounded half away from zero
    /// to the nearest rupiah.
    ///
    /// ```rust
    /// use warung_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupiah(10_000).line_total(3.0).rupiah(), 30_000);
    /// assert_eq!(Money::from_rupiah(3_333).line_total(0.5).rupiah(), 1_667);
    /// ```
    pub fn line_total(&self, quantity: f64) -> Money {
        Money((self.0 as f64 * quantity).round() as i64)
    }
}

/// Formats as `Rp 1.234.567` (dot thousands separator).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp {}", sign, grouped)
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

/// Multiplication by a whole quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_rupiah(0).to_string(), "Rp 0");
        assert_eq!(Money::from_rupiah(500).to_string(), "Rp 500");
        assert_eq!(Money::from_rupiah(10_000).to_string(), "Rp 10.000");
        assert_eq!(Money::from_rupiah(1_234_567).to_string(), "Rp 1.234.567");
        assert_eq!(Money::from_rupiah(-25_000).to_string(), "-Rp 25.000");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_rupiah(10_000);
        let b = Money::from_rupiah(2_500);
        assert_eq!((a + b).rupiah(), 12_500);
        assert_eq!((a - b).rupiah(), 7_500);
        assert_eq!((b * 4).rupiah(), 10_000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.rupiah(), 15_000);
    }

    #[test]
    fn test_line_total_rounds_once() {
        assert_eq!(Money::from_rupiah(12_500).line_total(2.35).rupiah(), 29_375);
        assert_eq!(Money::from_rupiah(1_000).line_total(0.3333).rupiah(), 333);
    }
}
