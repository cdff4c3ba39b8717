//! # Money Module
//!
//! Provides the `Money` type for the customer-facing quote price.
//!
//! ## Where Rounding Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ROUND ONCE, AT THE END                                                 │
//! │                                                                         │
//! │  area ─► base ─► polish ─► markups ─► discount ─► × qty ─► formula     │
//! │  Decimal Decimal  Decimal   Decimal     Decimal    Decimal    │         │
//! │                                                               ▼         │
//! │                                             Money::from_decimal_rounded │
//! │                                                    (integer cents)      │
//! │                                                                         │
//! │  Rounding each step would compound: 73.63 + 25.45 ≠ 73.631 + 25.447    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Intermediate amounts are exact `Decimal`s, so a true half cent such as
//! 222.345 rounds up instead of landing on whichever side binary floating
//! point happened to put it. The final quote is whole cents, so it always
//! carries exactly two decimal digits.
//!
//! ## Usage
//! ```rust
//! use glazier_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let quote = Money::from_decimal_rounded(Decimal::new(853_392_857, 6)).unwrap();
//! assert_eq!(quote.cents(), 85339);
//! assert_eq!(quote.to_string(), "$853.39");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: matches the cents columns the CRM already stores
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as cents**: the front end formats for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use glazier_core::money::Money;
    ///
    /// let price = Money::from_cents(13393); // Represents $133.93
    /// assert_eq!(price.cents(), 13393);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Rounds a dollar amount to the nearest cent, half away from zero.
    ///
    /// Returns `None` when the amount does not fit the i64 cents range.
    ///
    /// ## Example
    /// ```rust
    /// use glazier_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Money::from_decimal_rounded(Decimal::new(133_928_571, 6)).unwrap().cents(), 13393);
    /// assert_eq!(Money::from_decimal_rounded(Decimal::new(125, 3)).unwrap().cents(), 13);
    /// assert!(Money::from_decimal_rounded(Decimal::MAX).is_none());
    /// ```
    pub fn from_decimal_rounded(dollars: Decimal) -> Option<Self> {
        let rounded = dollars.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let cents = rounded.checked_mul(Decimal::ONE_HUNDRED)?;
        cents.to_i64().map(Money)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the amount as an exact two-place decimal.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
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
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with exactly two decimals.
///
/// ## Note
/// Locale formatting belongs to the front end.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(85339);
        assert_eq!(money.cents(), 85339);
        assert_eq!(money.dollars(), 853);
        assert_eq!(money.cents_part(), 39);
    }

    #[test]
    fn test_display_always_two_decimals() {
        assert_eq!(format!("{}", Money::from_cents(85339)), "$853.39");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(7)), "$0.07");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(Money::from_decimal_rounded(dec!(853.392857)).unwrap().cents(), 85339);
        assert_eq!(Money::from_decimal_rounded(dec!(133.928571)).unwrap().cents(), 13393);
        assert_eq!(Money::from_decimal_rounded(dec!(2.5)).unwrap().cents(), 250);
        assert_eq!(Money::from_decimal_rounded(dec!(-1.005)).unwrap().cents(), -101);
    }

    #[test]
    fn test_exact_half_cent_rounds_up() {
        // 222.345 has no exact binary form; as f64 it sits just below the midpoint.
        assert_eq!(Money::from_decimal_rounded(dec!(222.345)).unwrap().cents(), 22235);
        assert_eq!(Money::from_decimal_rounded(dec!(1.005)).unwrap().cents(), 101);
        assert_eq!(Money::from_decimal_rounded(dec!(0.004999)).unwrap().cents(), 0);
    }

    #[test]
    fn test_rounding_rejects_out_of_range() {
        assert!(Money::from_decimal_rounded(Decimal::MAX).is_none());
        assert!(Money::from_decimal_rounded(Decimal::from(100_000_000_000_000_000_i64)).is_none());
    }

    #[test]
    fn test_to_decimal() {
        let money = Money::from_cents(23895);
        assert_eq!(money.to_decimal(), dec!(238.95));
    }
}
