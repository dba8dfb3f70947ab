//! # Cart Ledger
//!
//! The mutable working set of an order before it becomes a bill: lines,
//! customer details, discount and payment method.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Ledger Operations                               │
//! │                                                                         │
//! │  Operator Action         Ledger Call                Effect              │
//! │  ───────────────         ───────────                ──────              │
//! │                                                                         │
//! │  Tap menu item ────────► add(catalog, id) ────────► qty + 1 or new line │
//! │                                                                         │
//! │  Type quantity ────────► set_quantity(.., n) ─────► qty = n (0 removes) │
//! │                                                                         │
//! │  Tap remove ───────────► remove(id) ──────────────► line dropped        │
//! │                                                                         │
//! │  Clear / bill done ────► clear() ─────────────────► everything default  │
//! │                                                                         │
//! │  NOTE: every check runs before any write, so a rejected call leaves     │
//! │        the ledger exactly as it was.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `item_id`
//! - Quantity is always ≥ 1 (a quantity of 0 removes the line)
//! - At mutation time, quantity never exceeds the catalog stock
//! - At most [`MAX_CART_LINES`] lines and [`MAX_ITEM_QUANTITY`] per line
//!
//! The ledger is plain data with `&mut self` mutations. Whoever owns it holds
//! it exclusively, so two adds of the same item can never both pass the stock
//! check.

use crate::catalog::CatalogCache;
use crate::error::{CartError, CartResult};
use crate::pricing;
use crate::types::{
    CartLine, CatalogItem, CustomerDetails, DiscountSpec, PaymentMethod, PendingOrder,
    PricingResult, TaxRate,
};
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

/// A cart line whose quantity is above what the catalog now holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockShortfall {
    pub item_id: String,
    pub name: String,
    pub requested: i64,
    /// Current stock, 0 if the item left the catalog or was switched off.
    pub available: i64,
}

/// The cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartLedger {
    lines: Vec<CartLine>,
    customer: CustomerDetails,
    discount: DiscountSpec,
    payment_method: PaymentMethod,
}

impl CartLedger {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn customer(&self) -> &CustomerDetails {
        &self.customer
    }

    pub fn discount(&self) -> &DiscountSpec {
        &self.discount
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Prices the current lines and discount.
    pub fn pricing(&self, tax_rate: TaxRate) -> PricingResult {
        pricing::price(&self.lines, &self.discount, tax_rate)
    }

    // =========================================================================
    // Line Mutations
    // =========================================================================

    /// Adds one unit of an item, returning the line's new quantity.
    ///
    /// ## Errors
    /// - `ItemNotFound` if the id is not in the catalog
    /// - `ItemUnavailable` if the item is switched off
    /// - `OutOfStock` if catalog stock is 0
    /// - `StockLimitExceeded` if the line is already at the stock ceiling
    /// - `QuantityTooLarge` / `CartFull` at the hard caps
    pub fn add(&mut self, catalog: &CatalogCache, item_id: &str) -> CartResult<i64> {
        let item = Self::sellable_item(catalog, item_id)?;

        if let Some(pos) = self.position(item_id) {
            let requested = self.lines[pos].quantity + 1;
            Self::check_ceiling(item, requested)?;
            self.lines[pos].quantity = requested;
            return Ok(requested);
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CartError::CartFull {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_item(item));
        Ok(1)
    }

    /// Sets the quantity of an item.
    ///
    /// ## Behavior
    /// - `n <= 0`: removes the line (no-op if absent)
    /// - `n > stock`: `StockLimitExceeded`, previous quantity kept
    /// - `n > MAX_ITEM_QUANTITY`: `QuantityTooLarge`
    /// - raising an existing line: same availability checks as [`add`](Self::add)
    /// - line absent: created at `n`, with the same checks as [`add`](Self::add)
    pub fn set_quantity(&mut self, catalog: &CatalogCache, item_id: &str, n: i64) -> CartResult<()> {
        if n <= 0 {
            self.remove(item_id);
            return Ok(());
        }

        let Some(pos) = self.position(item_id) else {
            let item = Self::sellable_item(catalog, item_id)?;
            Self::check_ceiling(item, n)?;
            if self.lines.len() >= MAX_CART_LINES {
                return Err(CartError::CartFull {
                    max: MAX_CART_LINES,
                });
            }
            let mut line = CartLine::from_item(item);
            line.quantity = n;
            self.lines.push(line);
            return Ok(());
        };

        // Raising needs a sellable item; lowering only needs it to exist.
        let item = if n > self.lines[pos].quantity {
            Self::sellable_item(catalog, item_id)?
        } else {
            catalog
                .lookup(item_id)
                .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?
        };
        Self::check_ceiling(item, n)?;
        self.lines[pos].quantity = n;
        Ok(())
    }

    /// Removes a line. Returns false if there was nothing to remove.
    pub fn remove(&mut self, item_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);
        self.lines.len() != before
    }

    /// Empties the cart and resets customer details, discount and payment
    /// method to their defaults.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // =========================================================================
    // Order Metadata
    // =========================================================================

    pub fn set_customer(&mut self, customer: CustomerDetails) {
        self.customer = customer;
    }

    /// Sets the discount, normalizing it into its valid range.
    pub fn set_discount(&mut self, discount: DiscountSpec) {
        self.discount = match discount {
            DiscountSpec::Amount(value) => DiscountSpec::amount(value),
            DiscountSpec::Percentage(bps) => DiscountSpec::percentage_bps(bps),
        };
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    // =========================================================================
    // Snapshot / Restore
    // =========================================================================

    /// Captures the full ledger state as a persistable snapshot.
    pub fn snapshot(&self) -> PendingOrder {
        PendingOrder {
            lines: self.lines.clone(),
            customer: self.customer.clone(),
            discount: self.discount,
            payment_method: self.payment_method,
        }
    }

    /// Replaces the ledger with a snapshot, returning the number of lines
    /// restored.
    ///
    /// Snapshot lines are trusted for price (it was frozen at add time) but
    /// not for shape: non-positive quantities are dropped, quantities above
    /// [`MAX_ITEM_QUANTITY`] are capped, duplicate item ids keep the first
    /// line, and at most [`MAX_CART_LINES`] lines are kept. Stock is not
    /// checked here; see [`validate_stock`](Self::validate_stock).
    pub fn restore(&mut self, order: PendingOrder) -> usize {
        let mut lines: Vec<CartLine> = Vec::with_capacity(order.lines.len());
        for mut line in order.lines {
            if line.quantity <= 0 || lines.iter().any(|l| l.item_id == line.item_id) {
                continue;
            }
            line.quantity = line.quantity.min(MAX_ITEM_QUANTITY);
            lines.push(line);
            if lines.len() == MAX_CART_LINES {
                break;
            }
        }

        self.lines = lines;
        self.customer = order.customer;
        self.set_discount(order.discount);
        self.payment_method = order.payment_method;
        self.lines.len()
    }

    /// Lists lines whose quantity is above current catalog stock.
    ///
    /// Items missing from the catalog or switched off count as zero stock.
    pub fn validate_stock(&self, catalog: &CatalogCache) -> Vec<StockShortfall> {
        self.lines
            .iter()
            .filter_map(|line| {
                let available = match catalog.lookup(&line.item_id) {
                    Some(item) if item.is_available => item.stock.max(0),
                    _ => 0,
                };
                (line.quantity > available).then(|| StockShortfall {
                    item_id: line.item_id.clone(),
                    name: line.name.clone(),
                    requested: line.quantity,
                    available,
                })
            })
            .collect()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn position(&self, item_id: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.item_id == item_id)
    }

    fn sellable_item<'a>(catalog: &'a CatalogCache, item_id: &str) -> CartResult<&'a CatalogItem> {
        let item = catalog
            .lookup(item_id)
            .ok_or_else(|| CartError::ItemNotFound(item_id.to_string()))?;

        if !item.is_available {
            return Err(CartError::ItemUnavailable {
                item_id: item.id.clone(),
                name: item.name.clone(),
            });
        }

        if item.stock <= 0 {
            return Err(CartError::OutOfStock {
                item_id: item.id.clone(),
                name: item.name.clone(),
            });
        }

        Ok(item)
    }

    fn check_ceiling(item: &CatalogItem, requested: i64) -> CartResult<()> {
        if requested > item.stock {
            return Err(CartError::StockLimitExceeded {
                item_id: item.id.clone(),
                name: item.name.clone(),
                available: item.stock.max(0),
                requested,
            });
        }

        if requested > MAX_ITEM_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                requested,
                max: MAX_ITEM_QUANTITY,
            });
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn item(id: &str, paise: i64, stock: i64) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: format!("Dish {}", id),
            category: "Main Course".to_string(),
            price: Money::from_paise(paise),
            stock,
            is_available: true,
        }
    }

    fn catalog() -> CatalogCache {
        CatalogCache::from_items(vec![
            item("butter-chicken", 28_000, 10),
            item("x", 15_000, 0),
            item("y", 12_000, 3),
            item("naan", 4_000, 5_000),
        ])
    }

    #[test]
    fn test_add_new_and_existing() {
        let catalog = catalog();
        let mut cart = CartLedger::new();

        assert_eq!(cart.add(&catalog, "butter-chicken").unwrap(), 1);
        assert_eq!(cart.add(&catalog, "butter-chicken").unwrap(), 2);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.line("butter-chicken").unwrap().unit_price, Money::from_paise(28_000));
    }

    #[test]
    fn test_add_out_of_stock_leaves_ledger_unchanged() {
        let catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add(&catalog, "y").unwrap();
        let before = cart.clone();

        let err = cart.add(&catalog, "x").unwrap_err();
        assert!(matches!(err, CartError::OutOfStock { ref item_id, .. } if item_id == "x"));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_unknown_and_unavailable() {
        let mut off = item("off", 1_000, 5);
        off.is_available = false;
        let catalog = CatalogCache::from_items(vec![off]);
        let mut cart = CartLedger::new();

        assert_eq!(
            cart.add(&catalog, "ghost"),
            Err(CartError::ItemNotFound("ghost".to_string()))
        );
        assert!(matches!(cart.add(&catalog, "off"), Err(CartError::ItemUnavailable { .. })));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_on_switched_off_item_only_lowers() {
        let mut cart = CartLedger::new();
        cart.add(&catalog(), "y").unwrap();
        cart.add(&catalog(), "y").unwrap();

        let mut off = item("y", 12_000, 3);
        off.is_available = false;
        let switched_off = CatalogCache::from_items(vec![off]);

        assert!(matches!(
            cart.set_quantity(&switched_off, "y", 3),
            Err(CartError::ItemUnavailable { .. })
        ));
        assert_eq!(cart.line("y").map(|l| l.quantity), Some(2));

        cart.set_quantity(&switched_off, "y", 1).unwrap();
        assert_eq!(cart.line("y").map(|l| l.quantity), Some(1));
    }

    #[test]
    fn test_add_at_ceiling_fails() {
        let catalog = catalog();
        let mut cart = CartLedger::new();
        for _ in 0..3 {
            cart.add(&catalog, "y").unwrap();
        }

        let err = cart.add(&catalog, "y").unwrap_err();
        assert_eq!(
            err,
            CartError::StockLimitExceeded {
                item_id: "y".to_string(),
                name: "Dish y".to_string(),
                available: 3,
                requested: 4,
            }
        );
        assert_eq!(cart.line("y").unwrap().quantity, 3);
    }

    #[test]
    fn test_set_quantity_above_stock_keeps_previous() {
        let catalog = catalog();
        let mut cart = CartLedger::new();
        cart.set_quantity(&catalog, "y", 2).unwrap();

        let err = cart.set_quantity(&catalog, "y", 5).unwrap_err();
        assert!(matches!(
            err,
            CartError::StockLimitExceeded { available: 3, requested: 5, .. }
        ));
        assert_eq!(cart.line("y").unwrap().quantity, 2);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add(&catalog, "y").unwrap();

        cart.set_quantity(&catalog, "y", 0).unwrap();
        assert!(cart.line("y").is_none());

        // Negative on an absent line is a no-op too
        cart.set_quantity(&catalog, "y", -4).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_hard_cap() {
        let catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add(&catalog, "naan").unwrap();

        let err = cart.set_quantity(&catalog, "naan", 1_000).unwrap_err();
        assert_eq!(err, CartError::QuantityTooLarge { requested: 1_000, max: 999 });
        assert_eq!(cart.line("naan").unwrap().quantity, 1);

        cart.set_quantity(&catalog, "naan", 999).unwrap();
        assert_eq!(cart.line("naan").unwrap().quantity, 999);
    }

    #[test]
    fn test_cart_full() {
        let items: Vec<CatalogItem> = (0..=MAX_CART_LINES)
            .map(|i| item(&format!("i{}", i), 100, 5))
            .collect();
        let catalog = CatalogCache::from_items(items);
        let mut cart = CartLedger::new();

        for i in 0..MAX_CART_LINES {
            cart.add(&catalog, &format!("i{}", i)).unwrap();
        }
        let err = cart.add(&catalog, &format!("i{}", MAX_CART_LINES)).unwrap_err();
        assert_eq!(err, CartError::CartFull { max: MAX_CART_LINES });

        // Existing lines can still grow
        assert_eq!(cart.add(&catalog, "i0").unwrap(), 2);
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add(&catalog, "y").unwrap();

        assert!(!cart.remove("naan"));
        assert!(cart.remove("y"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_resets_metadata() {
        let catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add(&catalog, "y").unwrap();
        cart.set_customer(CustomerDetails {
            customer_name: "Asha".to_string(),
            customer_phone: "9876543210".to_string(),
            table_number: "4".to_string(),
        });
        cart.set_discount(DiscountSpec::from_percent(10));
        cart.set_payment_method(PaymentMethod::Upi);

        cart.clear();

        assert_eq!(cart, CartLedger::new());
        assert_eq!(cart.payment_method(), PaymentMethod::Cash);
    }

    #[test]
    fn test_stock_ceiling_holds_for_any_sequence() {
        let catalog = catalog();
        let ids = ["butter-chicken", "x", "y", "naan", "ghost"];
        let mut cart = CartLedger::new();

        // Small LCG keeps the sequence reproducible
        let mut seed: u64 = 0x5eed;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            seed >> 33
        };

        for _ in 0..5_000 {
            let id = ids[(next() % ids.len() as u64) as usize];
            if next() % 3 == 0 {
                let n = (next() % 15) as i64 - 2;
                let _ = cart.set_quantity(&catalog, id, n);
            } else {
                let _ = cart.add(&catalog, id);
            }

            for line in cart.lines() {
                let stock = catalog.lookup(&line.item_id).map(|i| i.stock).unwrap_or(0);
                assert!(line.quantity >= 1);
                assert!(line.quantity <= stock, "{} at {} > {}", line.item_id, line.quantity, stock);
            }
        }
    }

    #[test]
    fn test_pricing_follows_mutations() {
        let catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add(&catalog, "butter-chicken").unwrap();
        cart.add(&catalog, "butter-chicken").unwrap();
        cart.set_discount(DiscountSpec::from_percent(10));

        let result = cart.pricing(TaxRate::from_bps(1800));
        assert_eq!(result.total, Money::from_paise(60_480));
    }

    #[test]
    fn test_snapshot_restore() {
        let catalog = catalog();
        let mut cart = CartLedger::new();
        cart.add(&catalog, "y").unwrap();
        cart.set_payment_method(PaymentMethod::Card);
        let snapshot = cart.snapshot();

        let mut restored = CartLedger::new();
        assert_eq!(restored.restore(snapshot), 1);
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_restore_sanitizes_lines() {
        let line = |id: &str, quantity: i64| CartLine {
            item_id: id.to_string(),
            name: id.to_string(),
            unit_price: Money::from_paise(100),
            quantity,
        };
        let order = PendingOrder {
            lines: vec![line("a", 0), line("b", 2), line("b", 7), line("c", 5_000)],
            discount: DiscountSpec::Percentage(50_000),
            ..Default::default()
        };

        let mut cart = CartLedger::new();
        assert_eq!(cart.restore(order), 2);
        assert_eq!(cart.line("b").unwrap().quantity, 2);
        assert_eq!(cart.line("c").unwrap().quantity, MAX_ITEM_QUANTITY);
        assert_eq!(*cart.discount(), DiscountSpec::Percentage(10_000));
    }

    #[test]
    fn test_validate_stock() {
        let mut cart = CartLedger::new();
        cart.add(&catalog(), "y").unwrap();
        cart.add(&catalog(), "y").unwrap();
        cart.add(&catalog(), "naan").unwrap();

        let fresh = CatalogCache::from_items(vec![item("y", 12_000, 1)]);
        let shortfalls = cart.validate_stock(&fresh);

        assert_eq!(shortfalls.len(), 2);
        assert_eq!(shortfalls[0].item_id, "y");
        assert_eq!(shortfalls[0].available, 1);
        assert_eq!(shortfalls[1].item_id, "naan");
        assert_eq!(shortfalls[1].available, 0);

        assert!(cart.validate_stock(&catalog()).is_empty());
    }
}
