//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Sum a few thousand invoice lines that way and the books stop          │
//! │  balancing by actual cents.                                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 count of the smallest currency unit.         │
//! │    Addition is exact, associative and commutative, so totals are       │
//! │    identical no matter what order lines are summed in.                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use minibooks_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(10_000); // $100.00
//!
//! // Arithmetic operations
//! let total = price + Money::from_cents(2_800); // $128.00
//!
//! // NEVER do this:
//! // let bad = Money::from_float(100.0); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::types::{Quantity, TaxRate};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Negative values exist transiently (outstanding balance
///   of an overpaid invoice); stored amounts are validated non-negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization (serializes as a
///   bare integer of cents)
///
/// The currency itself is not part of the value; an invoice carries one
/// currency code and every amount on it is denominated in that currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use minibooks_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use minibooks_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -$5.50, not -$4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major_units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99, sign dropped).
    #[inline]
    pub const fn minor_units(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a fixed-point quantity.
    ///
    /// ## Implementation
    /// Integer math in i128: `(cents × quantity_milli + 500) / 1000`,
    /// rounding half away from zero on the thousandths boundary. A
    /// whole-number quantity is therefore always exact:
    ///
    /// ```rust
    /// use minibooks_core::money::Money;
    /// use minibooks_core::types::Quantity;
    ///
    /// let unit_price = Money::from_cents(10_000); // $100.00
    /// assert_eq!(unit_price.multiply_quantity(Quantity::from_units(2)).cents(), 20_000);
    ///
    /// // 2.5 × $0.99 = $2.475 → rounds to $2.48
    /// let penny_shy = Money::from_cents(99);
    /// assert_eq!(penny_shy.multiply_quantity(Quantity::from_milli(2500)).cents(), 248);
    /// ```
    pub fn multiply_quantity(&self, qty: Quantity) -> Money {
        // i128 prevents overflow on large amounts
        let cents = (self.0 as i128 * qty.milli() as i128 + 500) / 1000;
        Money::from_cents(cents as i64)
    }

    /// Calculates the tax on this amount at the given rate.
    ///
    /// ## Implementation
    /// The percentage is carried as basis points, so `amount × rate / 100`
    /// becomes pure integer math: `(cents × bps + 5000) / 10000`, rounding
    /// half away from zero. The rate is never a divisor, so no division by
    /// zero can occur.
    ///
    /// ## Example
    /// ```rust
    /// use minibooks_core::money::Money;
    /// use minibooks_core::types::TaxRate;
    ///
    /// let line_total = Money::from_cents(20_000); // $200.00
    /// let vat = TaxRate::from_bps(1400);          // 14%
    ///
    /// assert_eq!(line_total.tax_amount(vat).cents(), 2_800); // $28.00
    /// ```
    pub fn tax_amount(&self, rate: TaxRate) -> Money {
        // i128 prevents overflow on large amounts
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. The front end formats amounts with the
/// invoice's currency code and locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.major_units().abs(),
            self.minor_units()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Summing an iterator of Money values (used by the totals aggregator and
/// the report reducers).
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
