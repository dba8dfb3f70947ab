//! # Pricing Engine
//!
//! Turns cart lines and a discount into `{subtotal, tax, discount, total}`.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► subtotal = Σ unit_price × quantity      (exact, in paise)   │
//! │                │                                                        │
//! │                ├──► tax      = round(subtotal × tax_rate)              │
//! │                │                                                        │
//! │                └──► discount = round(subtotal × pct)   (percentage)    │
//! │                              = min(amount, subtotal)   (amount)        │
//! │                                                                         │
//! │  total = max(0, subtotal + tax − discount)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax is charged on the pre-discount subtotal. Rounding happens once per
//! derived figure, half away from zero, so the result is reproducible to the
//! paisa on any platform.
//!
//! ## Example
//! ```rust
//! use masala_core::money::Money;
//! use masala_core::pricing::price;
//! use masala_core::types::{CartLine, DiscountSpec, TaxRate};
//!
//! let lines = vec![CartLine {
//!     item_id: "m1".into(),
//!     name: "Butter Chicken".into(),
//!     unit_price: Money::from_paise(28_000),
//!     quantity: 2,
//! }];
//!
//! let result = price(&lines, &DiscountSpec::from_percent(10), TaxRate::from_bps(1800));
//! assert_eq!(result.subtotal.paise(), 56_000);
//! assert_eq!(result.tax.paise(), 10_080);
//! assert_eq!(result.discount_amount.paise(), 5_600);
//! assert_eq!(result.total.paise(), 60_480);
//! ```

use crate::money::Money;
use crate::types::{CartLine, DiscountSpec, PricingResult, TaxRate, MAX_DISCOUNT_BPS};

/// Prices a set of cart lines.
///
/// Referentially transparent: identical inputs always give an identical
/// [`PricingResult`].
pub fn price(lines: &[CartLine], discount: &DiscountSpec, tax_rate: TaxRate) -> PricingResult {
    let subtotal = subtotal(lines);
    let tax = subtotal.calculate_tax(tax_rate).floor_zero();
    let discount_amount = discount_amount(subtotal, discount);
    let total = (subtotal + tax - discount_amount).floor_zero();

    PricingResult {
        subtotal,
        tax,
        discount_amount,
        total,
    }
}

/// Exact sum of line totals.
pub fn subtotal(lines: &[CartLine]) -> Money {
    lines.iter().map(CartLine::line_total).sum::<Money>().floor_zero()
}

/// Discount for a given subtotal, bounded to `[0, subtotal]`.
pub fn discount_amount(subtotal: Money, discount: &DiscountSpec) -> Money {
    let raw = match *discount {
        DiscountSpec::Percentage(bps) => subtotal.apply_bps(bps.min(MAX_DISCOUNT_BPS)),
        DiscountSpec::Amount(value) => value,
    };
    raw.floor_zero().min(subtotal)
}

// =============================================================================
// Unit Tests
// =============================================================================
