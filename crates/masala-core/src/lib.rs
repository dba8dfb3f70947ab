//! # masala-core: Pure Billing Logic for Masala POS
//!
//! This crate is the **heart** of the billing engine. It contains the cart,
//! pricing and receipt rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Masala POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/register (BillingSession)                  │   │
//! │  │    add_item, set_quantity, submit, print_receipt               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ masala-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │ catalog │ │  cart   │ │ pricing │ │ receipt │ │  money  │  │   │
//! │  │   │  Cache  │ │ Ledger  │ │  price  │ │ render  │ │  Money  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼─────────────┐   ┌────────────────▼───────────────┐   │
//! │  │  masala-db (snapshot)      │   │  masala-client (REST API)      │   │
//! │  └────────────────────────────┘   └────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogItem, CartLine, Bill, PendingOrder, ...)
//! - [`money`] - Money type with integer arithmetic in paise
//! - [`pricing`] - Subtotal / tax / discount / total computation
//! - [`catalog`] - Last-fetched menu items, read-only to the cart
//! - [`cart`] - The cart ledger with stock ceilings
//! - [`receipt`] - Fixed-layout receipt document and renderers
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use masala_core::money::Money;
//! use masala_core::types::TaxRate;
//!
//! let subtotal = Money::from_paise(56_000); // ₹560.00
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(1800));
//! assert_eq!(tax.paise(), 10_080); // ₹100.80
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod pricing;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartLedger, StockShortfall};
pub use catalog::CatalogCache;
pub use error::{CartError, ValidationError};
pub use money::Money;
pub use pricing::price;
pub use receipt::{BusinessInfo, Receipt};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax rate applied when configuration does not override it (18%).
pub const DEFAULT_TAX_RATE: TaxRate = TaxRate::from_bps(1800);

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single item in the cart.
///
/// Guards against typing 1000 instead of 10 when the catalog carries a large
/// stock figure.
pub const MAX_ITEM_QUANTITY: i64 = 999;
