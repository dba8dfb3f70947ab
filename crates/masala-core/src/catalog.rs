//! # Catalog Cache
//!
//! Holds the last-fetched set of sellable menu items.
//!
//! The cache is replaced wholesale: a refresh builds the new item list and
//! index first and then swaps both in one assignment, so a reader never sees
//! half of an old catalog and half of a new one. Fetching is done elsewhere
//! (the register's billing session); this type only stores what was fetched.
//!
//! ```text
//!   MenuSource::fetch_menu() ──► Vec<CatalogItem> ──► CatalogCache::replace()
//!                                                          │
//!                 CartLedger::add / set_quantity ◄── lookup(item_id)
//! ```

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::CatalogItem;

/// Last-known menu items, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct CatalogCache {
    items: Vec<CatalogItem>,
    index: HashMap<String, usize>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl CatalogCache {
    /// Creates an empty cache that has never been refreshed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cache from items, stamped with the current time.
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        let mut cache = Self::new();
        cache.replace(items);
        cache
    }

    /// Replaces the full item set, returning the new item count.
    ///
    /// If the server sends the same id twice, the later entry wins.
    pub fn replace(&mut self, items: Vec<CatalogItem>) -> usize {
        self.replace_at(items, Utc::now())
    }

    /// Same as [`replace`](Self::replace) with an explicit refresh time.
    pub fn replace_at(&mut self, items: Vec<CatalogItem>, at: DateTime<Utc>) -> usize {
        let mut deduped: Vec<CatalogItem> = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());

        for item in items {
            match index.get(&item.id) {
                Some(&pos) => deduped[pos] = item,
                None => {
                    index.insert(item.id.clone(), deduped.len());
                    deduped.push(item);
                }
            }
        }

        let count = deduped.len();
        *self = CatalogCache {
            items: deduped,
            index,
            refreshed_at: Some(at),
        };
        count
    }

    /// Looks up an item by id. `None` means not found.
    pub fn lookup(&self, item_id: &str) -> Option<&CatalogItem> {
        self.index.get(item_id).map(|&pos| &self.items[pos])
    }

    /// All items in server order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Items that can currently be added to a cart.
    pub fn sellable(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items
            .iter()
            .filter(|item| item.is_available && item.stock > 0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// When the cache was last replaced, `None` if never.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// True if the cache was never refreshed or is older than `max_age`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.refreshed_at {
            None => true,
            Some(at) => {
                let age = now.signed_duration_since(at);
                match chrono::Duration::from_std(max_age) {
                    Ok(max) => age > max,
                    Err(_) => false,
                }
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
    use crate::money::Money;

    fn item(id: &str, stock: i64) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: format!("Dish {}", id),
            category: "Main Course".to_string(),
            price: Money::from_paise(20_000),
            stock,
            is_available: true,
        }
    }

    #[test]
    fn test_replace_and_lookup() {
        let mut cache = CatalogCache::new();
        assert!(cache.refreshed_at().is_none());

        let count = cache.replace(vec![item("a", 3), item("b", 0)]);
        assert_eq!(count, 2);
        assert_eq!(cache.lookup("a").map(|i| i.stock), Some(3));
        assert!(cache.lookup("missing").is_none());
        assert!(cache.refreshed_at().is_some());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut cache = CatalogCache::from_items(vec![item("a", 3), item("b", 1)]);
        cache.replace(vec![item("c", 5)]);

        assert_eq!(cache.len(), 1);
        assert!(cache.lookup("a").is_none());
        assert!(cache.lookup("c").is_some());
    }

    #[test]
    fn test_duplicate_ids_keep_last() {
        let cache = CatalogCache::from_items(vec![item("a", 3), item("a", 9)]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("a").map(|i| i.stock), Some(9));
    }

    #[test]
    fn test_sellable_filters_unavailable_and_empty() {
        let mut off = item("c", 4);
        off.is_available = false;
        let cache = CatalogCache::from_items(vec![item("a", 3), item("b", 0), off]);

        let ids: Vec<&str> = cache.sellable().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_staleness() {
        let mut cache = CatalogCache::new();
        let now = Utc::now();
        assert!(cache.is_stale(now, Duration::from_secs(60)));

        cache.replace_at(vec![item("a", 1)], now - chrono::Duration::seconds(120));
        assert!(cache.is_stale(now, Duration::from_secs(60)));
        assert!(!cache.is_stale(now, Duration::from_secs(300)));
    }
}
