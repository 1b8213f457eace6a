//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Catalog prices arrive as JSON numbers: 550.5                           │
//! │  As f64:  550.5 * 3 * 0.2 = 330.29999999999995  ❌                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (poisha / cents)                     │
//! │    "550.5" ──parse_major──► 55050 ──► all math in i64                   │
//! │    The text is parsed digit by digit, never through f64                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Range
//! Operators use plain `i64` arithmetic. Everything a shopper can influence is
//! bounded before it reaches them (`MAX_UNIT_PRICE`, `MAX_ITEM_QUANTITY`,
//! `MAX_CART_ITEMS`, `MAX_TIP`), which keeps order totals around 1e14 minor
//! units at most.
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price = Money::from_major(500);            // 500.00
//! let line = price * 3;                           // 1500.00
//! let parsed = Money::parse_major("550.5").unwrap();
//! assert_eq!(parsed.minor(), 55050);
//! assert_eq!((line + parsed).minor(), 205050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Number of minor units in one major unit.
pub const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit of the store's currency.
///
/// ## Where Money Flows
/// ```text
/// Variant size table ──► resolve_price_info ──► listing display price
///         │
///         └──► resolve_unit_price ──► CartLine.unit_price (frozen)
///                                           │
///   Cart.subtotal ──► + delivery + tip ──► PaymentSplit ──► ChargeRequest
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(2000).minor(), 200_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Parses a decimal amount written in major units.
    ///
    /// Accepts an optional sign, digits, and at most two fractional digits.
    /// Surrounding whitespace is ignored. Anything else returns `None`.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::parse_major("500"), Some(Money::from_major(500)));
    /// assert_eq!(Money::parse_major("12.3"), Some(Money::from_minor(1230)));
    /// assert_eq!(Money::parse_major("-3.05"), Some(Money::from_minor(-305)));
    /// assert_eq!(Money::parse_major("abc"), None);
    /// assert_eq!(Money::parse_major("1.999"), None);
    /// ```
    pub fn parse_major(text: &str) -> Option<Money> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > 2 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }

        let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let frac_value: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().ok()? * 10,
            _ => frac.parse().ok()?,
        };

        let minor = whole_value
            .checked_mul(MINOR_PER_MAJOR)?
            .checked_add(frac_value)?;

        Some(Money(if negative { -minor } else { minor }))
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole major-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the minor-unit remainder (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
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

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Takes a share of this amount expressed in basis points.
    ///
    /// Rounds half up, in minor units: `(amount * bps + 5000) / 10000`.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// // 20% of 0.99 = 0.198 → 0.20
    /// assert_eq!(Money::from_minor(99).percentage_bps(2000).minor(), 20);
    /// ```
    pub fn percentage_bps(&self, bps: u32) -> Money {
        // i128 so large carts cannot overflow the intermediate product
        let share = (self.0 as i128 * bps as i128 + 5000).div_euclid(10000);
        Money(share as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering without a currency symbol.
///
/// ## Note
/// Storefront display goes through `StoreConfig::format_currency` in the API
/// crate, which owns the symbol and locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
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

/// Multiplication by quantity.
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

// =============================================================================
// Unit Tests
// =============================================================================
