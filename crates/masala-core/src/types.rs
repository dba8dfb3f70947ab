//! # Domain Types
//!
//! Core domain types used throughout Masala POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │    CartLine     │   │  PendingOrder   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (_id)       │──►│  item_id        │──►│  lines          │       │
//! │  │  price          │   │  unit_price     │   │  customer       │       │
//! │  │  stock          │   │  quantity ≥ 1   │   │  discount       │       │
//! │  │  is_available   │   └─────────────────┘   │  payment_method │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountSpec   │   │ PricingResult   │   │      Bill       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Amount(Money)  │   │  subtotal, tax  │   │  bill_number    │       │
//! │  │  Percentage(bps)│   │  discount, total│   │  (server owned) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Shapes
//! Every type serializes in camelCase with money as decimal rupees, matching
//! the REST API and the pending-order snapshot. Identifiers issued by the
//! server (`_id`) are accepted as `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::money::{self, Money};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (GST on restaurant service)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct.max(0.0) * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        crate::DEFAULT_TAX_RATE
    }
}

// =============================================================================
// Catalog Item
// =============================================================================

/// A sellable menu item as last fetched from the menu endpoint.
///
/// Owned by the [`CatalogCache`](crate::catalog::CatalogCache); the cart reads
/// price and stock from it but never writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Server identifier (`_id` on the wire).
    #[serde(alias = "_id")]
    pub id: String,

    /// Display name shown on the menu and receipt.
    pub name: String,

    #[serde(default)]
    pub category: String,

    /// Unit price.
    #[serde(with = "money::rupees")]
    pub price: Money,

    /// Units currently available. The stock ceiling for cart lines.
    #[serde(default)]
    pub stock: i64,

    /// Kitchen-side switch; unavailable items cannot be added.
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// The unit price is frozen when the item is first added, so a catalog refresh
/// mid-order does not reprice lines already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: String,
    pub name: String,
    #[serde(with = "money::rupees")]
    pub unit_price: Money,
    /// Always ≥ 1 inside a ledger; a zero quantity removes the line.
    pub quantity: i64,
}

impl CartLine {
    /// Creates a new line at quantity 1 from a catalog item.
    pub fn from_item(item: &CatalogItem) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            quantity: 1,
        }
    }

    /// Unit price × quantity, exact.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Discount applied to the whole cart.
///
/// ## Wire Shape
/// ```text
/// {"type": "percentage", "value": 10}     → Percentage(1000 bps)
/// {"type": "amount",     "value": 50.5}   → Amount(₹50.50)
/// ```
///
/// Percentages are held in basis points and clamped to `[0, 100%]`. Amounts
/// are clamped to `[0, subtotal]` when pricing runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DiscountSpec {
    /// Fixed amount off the subtotal.
    Amount(#[serde(with = "money::rupees")] Money),
    /// Percentage of the subtotal, in basis points.
    Percentage(#[serde(with = "percent")] u32),
}

/// Upper bound for percentage discounts (100%).
pub const MAX_DISCOUNT_BPS: u32 = 10_000;

impl DiscountSpec {
    /// No discount.
    pub const fn none() -> Self {
        DiscountSpec::Percentage(0)
    }

    /// Fixed amount discount. Negative amounts become zero.
    pub fn amount(value: Money) -> Self {
        DiscountSpec::Amount(value.floor_zero())
    }

    /// Percentage discount from basis points, clamped to 100%.
    pub fn percentage_bps(bps: u32) -> Self {
        DiscountSpec::Percentage(bps.min(MAX_DISCOUNT_BPS))
    }

    /// Percentage discount from a whole percentage (`10` → 10%).
    pub fn from_percent(pct: u32) -> Self {
        Self::percentage_bps(pct.saturating_mul(100))
    }

    /// Checks if this discount can never reduce a total.
    pub fn is_none(&self) -> bool {
        match self {
            DiscountSpec::Amount(value) => !value.is_positive(),
            DiscountSpec::Percentage(bps) => *bps == 0,
        }
    }
}

impl Default for DiscountSpec {
    fn default() -> Self {
        DiscountSpec::none()
    }
}

/// Serde boundary for percentage discounts: `10.5` on the wire ↔ 1050 bps.
mod percent {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::MAX_DISCOUNT_BPS;

    pub fn serialize<S: Serializer>(bps: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*bps as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        if !raw.is_finite() {
            return Err(de::Error::custom(format!("invalid percentage: {raw}")));
        }
        let bps = (raw * 100.0).round().clamp(0.0, MAX_DISCOUNT_BPS as f64);
        Ok(bps as u32)
    }
}

// =============================================================================
// Customer Details & Payment Method
// =============================================================================

/// Customer metadata attached to an order. All fields are optional free text
/// and default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub table_number: String,
}

/// How the customer settles the bill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
}

impl PaymentMethod {
    /// Label printed on receipts.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "UPI",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

// =============================================================================
// Pending Order (persisted snapshot)
// =============================================================================

/// Durable snapshot of an in-progress cart.
///
/// ## JSON Shape
/// ```text
/// {
///   "lines": [{"itemId": "m1", "name": "Butter Chicken", "unitPrice": 280.0, "quantity": 2}],
///   "customerName": "Asha", "customerPhone": "", "tableNumber": "4",
///   "discount": {"type": "percentage", "value": 10.0},
///   "paymentMethod": "upi"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    #[serde(default)]
    pub lines: Vec<CartLine>,
    #[serde(flatten)]
    pub customer: CustomerDetails,
    #[serde(default)]
    pub discount: DiscountSpec,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl PendingOrder {
    /// True when the snapshot carries nothing worth restoring.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Pricing Result
// =============================================================================

/// Derived totals for a cart. Never persisted on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    #[serde(with = "money::rupees")]
    pub subtotal: Money,
    #[serde(with = "money::rupees")]
    pub tax: Money,
    #[serde(with = "money::rupees")]
    pub discount_amount: Money,
    #[serde(with = "money::rupees")]
    pub total: Money,
}

// =============================================================================
// Bill (server-authoritative)
// =============================================================================

/// Lifecycle status of a bill as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Paid,
    Pending,
    Cancelled,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// A line on a server-issued bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    /// Reference to the menu item. The server may send the id or the
    /// populated item document.
    #[serde(
        default,
        alias = "menuItemId",
        deserialize_with = "menu_item_ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub menu_item: Option<String>,
    pub name: String,
    pub quantity: i64,
    /// Unit price.
    #[serde(with = "money::rupees")]
    pub price: Money,
    #[serde(
        default,
        with = "money::rupees::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total: Option<Money>,
}

impl BillItem {
    /// Line total, computed when the server omits it.
    pub fn line_total(&self) -> Money {
        self.total
            .unwrap_or_else(|| self.price.multiply_quantity(self.quantity))
    }
}

fn menu_item_ref<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ref {
        Id(String),
        Doc {
            #[serde(alias = "_id")]
            id: String,
        },
    }

    Ok(Option::<Ref>::deserialize(deserializer)?.map(|r| match r {
        Ref::Id(id) | Ref::Doc { id } => id,
    }))
}

/// The authoritative bill record returned by the bill-creation endpoint.
///
/// The billing engine only reads this record; it never invents or changes
/// `id` or `bill_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// Server identifier (`_id` on the wire).
    #[serde(alias = "_id")]
    pub id: String,

    /// Human-readable bill number, e.g. `B-1001`.
    pub bill_number: String,

    #[serde(default)]
    pub items: Vec<BillItem>,

    #[serde(with = "money::rupees")]
    pub subtotal: Money,
    #[serde(default, with = "money::rupees")]
    pub tax: Money,
    #[serde(default, with = "money::rupees")]
    pub discount: Money,
    #[serde(with = "money::rupees")]
    pub total: Money,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub table_number: String,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub status: BillStatus,
}

// =============================================================================
// Unit Tests
// =============================================================================
