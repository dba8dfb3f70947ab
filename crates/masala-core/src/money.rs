//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A subtotal built from float line totals drifts by a paisa here and     │
//! │  there, and the drift compounds once tax and discount are applied.      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    ₹280.00 = 28000 paise, 28000 × 2 = 56000 paise, exactly              │
//! │    Rounding happens once, when a rate is applied                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The remote API speaks decimal rupees (`"price": 280.5`). Conversion happens
//! only at the serde boundary through [`rupees`], never in business logic.
//!
//! ## Usage
//! ```rust
//! use masala_core::money::Money;
//!
//! let price = Money::from_paise(28_000); // ₹280.00
//! let line = price * 2;                  // ₹560.00
//! assert_eq!(line.paise(), 56_000);
//! assert_eq!(line.to_string(), "₹560.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate results such as `subtotal - discount`
///   may dip below zero before they are floored
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// CatalogItem.price ──► CartLine.unit_price ──► CartLine.line_total
///                                                     │
///                                                     ▼
///                     PricingResult { subtotal, tax, discount_amount, total }
///                                                     │
///                                                     ▼
///                                    Bill (server) ──► Receipt
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ## Example
    /// ```rust
    /// use masala_core::money::Money;
    ///
    /// let price = Money::from_paise(28_050); // ₹280.50
    /// assert_eq!(price.paise(), 28_050);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from rupees and paise.
    ///
    /// For negative amounts only the rupee part should be negative:
    /// `from_rupees_paise(-5, 50)` is -₹5.50.
    #[inline]
    pub const fn from_rupees_paise(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * 100 - paise)
        } else {
            Money(rupees * 100 + paise)
        }
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
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

    /// Clamps negative values to zero.
    ///
    /// ```rust
    /// use masala_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(-40).floor_zero(), Money::zero());
    /// assert_eq!(Money::from_paise(40).floor_zero().paise(), 40);
    /// ```
    #[inline]
    pub fn floor_zero(self) -> Self {
        self.max(Money::zero())
    }

    /// Calculates tax at the given rate, rounding half away from zero.
    ///
    /// ## Rounding
    /// ```text
    /// ₹560.00 × 18%   = 100.80      → 10080 paise (exact)
    /// ₹0.05   × 18%   = 0.009       → 1 paisa     (0.9 rounds up)
    /// ₹0.25   × 18%   = 0.045       → 5 paise     (0.5 rounds away from 0)
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use masala_core::money::Money;
    /// use masala_core::types::TaxRate;
    ///
    /// let tax = Money::from_paise(56_000).calculate_tax(TaxRate::from_bps(1800));
    /// assert_eq!(tax.paise(), 10_080);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.apply_bps(rate.bps())
    }

    /// Returns `self × bps / 10000`, rounded half away from zero.
    ///
    /// Used for both tax rates and percentage discounts (1000 bps = 10%).
    pub fn apply_bps(&self, bps: u32) -> Money {
        // i128 keeps `paise × bps` from overflowing on large amounts
        Money::from_paise(round_div(self.0 as i128 * bps as i128, 10_000) as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use masala_core::money::Money;
    ///
    /// let unit_price = Money::from_paise(14_950); // ₹149.50
    /// assert_eq!(unit_price.multiply_quantity(3).paise(), 44_850);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Formats the amount without a currency symbol (`"1234.50"`).
    pub fn format_plain(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `₹560.00`. Receipts use the configured currency symbol via
/// [`Money::format_plain`] instead.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
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

/// Parses operator input such as `"50"`, `"49.5"` or `"₹49.50"`.
///
/// At most two decimal places; no floating point is involved.
impl std::str::FromStr for Money {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let body = body.trim_start_matches('₹');

        let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
        let digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
        if !digits(whole) || (!frac.is_empty() && !digits(frac)) || frac.len() > 2 {
            return Err(format!("invalid amount: {trimmed}"));
        }

        let rupees: i64 = whole
            .parse()
            .map_err(|_| format!("amount too large: {trimmed}"))?;
        let paise: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };

        let total = rupees
            .checked_mul(100)
            .and_then(|p| p.checked_add(paise))
            .ok_or_else(|| format!("amount too large: {trimmed}"))?;
        Ok(Money(if negative { -total } else { total }))
    }
}

// =============================================================================
// Serde Boundary: Decimal Rupees
// =============================================================================

/// Serializes `Money` as a decimal rupee number (`604.8`) and reads it back
/// rounded to the nearest paisa.
///
/// ## Usage
/// ```rust
/// use masala_core::money::Money;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Line {
///     #[serde(with = "masala_core::money::rupees")]
///     price: Money,
/// }
///
/// let line: Line = serde_json::from_str(r#"{"price": 280.5}"#).unwrap();
/// assert_eq!(line.price.paise(), 28_050);
/// ```
pub mod rupees {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::Money;

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.paise() as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        from_f64(raw).ok_or_else(|| de::Error::custom(format!("invalid amount: {raw}")))
    }

    pub(crate) fn from_f64(raw: f64) -> Option<Money> {
        if !raw.is_finite() {
            return None;
        }
        // f64::round is half away from zero, matching Money::apply_bps
        Some(Money::from_paise((raw * 100.0).round() as i64))
    }

    /// Same as the parent module for `Option<Money>` fields.
    pub mod option {
        use serde::{de, Deserialize, Deserializer, Serializer};

        use super::super::Money;

        pub fn serialize<S: Serializer>(
            value: &Option<Money>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(money) => super::serialize(money, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Money>, D::Error> {
            match Option::<f64>::deserialize(deserializer)? {
                Some(raw) => super::from_f64(raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid amount: {raw}"))),
                None => Ok(None),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operator_input() {
        assert_eq!("50".parse::<Money>(), Ok(Money::from_paise(5_000)));
        assert_eq!("49.5".parse::<Money>(), Ok(Money::from_paise(4_950)));
        assert_eq!(" ₹49.05 ".parse::<Money>(), Ok(Money::from_paise(4_905)));
        assert_eq!("-5.50".parse::<Money>(), Ok(Money::from_paise(-550)));

        assert!("".parse::<Money>().is_err());
        assert!("4.999".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1e3".parse::<Money>().is_err());
        assert!(".5".parse::<Money>().is_err());
    }

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(28_050);
        assert_eq!(money.paise(), 28_050);
        assert_eq!(money.rupees(), 280);
        assert_eq!(money.paise_part(), 50);
    }

    #[test]
    fn test_from_rupees_paise() {
        assert_eq!(Money::from_rupees_paise(280, 50).paise(), 28_050);
        assert_eq!(Money::from_rupees_paise(-5, 50).paise(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(60_480).to_string(), "₹604.80");
        assert_eq!(Money::from_paise(500).to_string(), "₹5.00");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
        assert_eq!(Money::from_paise(60_480).format_plain(), "604.80");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3).paise(), 3000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.paise(), 2000);
    }

    #[test]
    fn test_tax_eighteen_percent() {
        let tax = Money::from_paise(56_000).calculate_tax(TaxRate::from_bps(1800));
        assert_eq!(tax.paise(), 10_080);
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 25 paise × 18% = 4.5 paise → 5
        assert_eq!(Money::from_paise(25).calculate_tax(TaxRate::from_bps(1800)).paise(), 5);
        // 5 paise × 18% = 0.9 paise → 1
        assert_eq!(Money::from_paise(5).calculate_tax(TaxRate::from_bps(1800)).paise(), 1);
        // 2 paise × 18% = 0.36 paise → 0
        assert_eq!(Money::from_paise(2).calculate_tax(TaxRate::from_bps(1800)).paise(), 0);
        // Negative inputs mirror positive ones
        assert_eq!(Money::from_paise(-25).apply_bps(1800).paise(), -5);
    }

    #[test]
    fn test_floor_zero() {
        assert!(Money::from_paise(-1).floor_zero().is_zero());
        assert_eq!(Money::from_paise(7).floor_zero().paise(), 7);
    }

    #[test]
    fn test_rupee_serde_boundary() {
        #[derive(Serialize, Deserialize)]
        struct Wire {
            #[serde(with = "rupees")]
            amount: Money,
            #[serde(with = "rupees::option", default)]
            maybe: Option<Money>,
        }

        let wire: Wire = serde_json::from_str(r#"{"amount": 604.8}"#).unwrap();
        assert_eq!(wire.amount.paise(), 60_480);
        assert!(wire.maybe.is_none());

        // Integers are accepted as whole rupees
        let wire: Wire = serde_json::from_str(r#"{"amount": 280, "maybe": 0.1}"#).unwrap();
        assert_eq!(wire.amount.paise(), 28_000);
        assert_eq!(wire.maybe, Some(Money::from_paise(10)));

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["amount"], serde_json::json!(280.0));
    }
}
