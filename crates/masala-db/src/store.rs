//! # Snapshot Store
//!
//! The persistence seam for the pending order.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BillingSession                                                         │
//! │       │  Arc<dyn SnapshotStore>                                         │
//! │       ▼                                                                 │
//! │  ┌───────────────────────┐      ┌───────────────────────────┐          │
//! │  │ PendingOrderRepository│      │   MemorySnapshotStore     │          │
//! │  │  (SQLite, production) │      │ (tests)                   │          │
//! │  └───────────────────────┘      └───────────────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contract
//! - `save` overwrites whatever was stored before
//! - `load` returns `Ok(None)` when nothing is stored; that is not an error
//! - `clear` on an empty store succeeds

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use masala_core::PendingOrder;
use tokio::sync::Mutex;

use crate::error::SnapshotError;

/// Durable home for the in-progress order.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Stores `order`, replacing any previous snapshot.
    async fn save(&self, order: &PendingOrder) -> Result<(), SnapshotError>;

    /// Returns the stored snapshot, if any.
    async fn load(&self) -> Result<Option<PendingOrder>, SnapshotError>;

    /// Deletes the stored snapshot.
    async fn clear(&self) -> Result<(), SnapshotError>;
}

#[async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    async fn save(&self, order: &PendingOrder) -> Result<(), SnapshotError> {
        (**self).save(order).await
    }

    async fn load(&self) -> Result<Option<PendingOrder>, SnapshotError> {
        (**self).load().await
    }

    async fn clear(&self) -> Result<(), SnapshotError> {
        (**self).clear().await
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Process-local store.
///
/// Snapshots are held as JSON text, the same form the SQLite repository
/// writes, so a round trip through this store exercises the wire shape.
/// Writes can be switched off to simulate a full disk.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    payload: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `save` and `clear` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `save` and `clear` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw JSON currently stored.
    pub async fn raw(&self) -> Option<String> {
        self.payload.lock().await.clone()
    }

    /// Replaces the stored JSON verbatim (for corrupt-payload tests).
    pub async fn set_raw(&self, raw: impl Into<String>) {
        *self.payload.lock().await = Some(raw.into());
    }

    fn check_writable(&self) -> Result<(), SnapshotError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SnapshotError::Unavailable(
                "writes disabled on memory store".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, order: &PendingOrder) -> Result<(), SnapshotError> {
        self.check_writable()?;
        let json = serde_json::to_string(order)?;
        *self.payload.lock().await = Some(json);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> Result<Option<PendingOrder>, SnapshotError> {
        let guard = self.payload.lock().await;
        match guard.as_deref() {
            None => Ok(None),
            Some(json) => match serde_json::from_str(json) {
                Ok(order) => Ok(Some(order)),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable pending order snapshot");
                    Ok(None)
                }
            },
        }
    }

    async fn clear(&self) -> Result<(), SnapshotError> {
        self.check_writable()?;
        *self.payload.lock().await = None;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use masala_core::{CartLine, DiscountSpec, Money, PaymentMethod};

    fn order() -> PendingOrder {
        PendingOrder {
            lines: vec![CartLine {
                item_id: "m1".to_string(),
                name: "Butter Chicken".to_string(),
                unit_price: Money::from_paise(28_000),
                quantity: 2,
            }],
            discount: DiscountSpec::from_percent(10),
            payment_method: PaymentMethod::Card,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemorySnapshotStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&order()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(order()));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_writes_keep_previous_snapshot() {
        let store = MemorySnapshotStore::new();
        store.save(&order()).await.unwrap();

        store.set_fail_writes(true);
        let mut changed = order();
        changed.lines[0].quantity = 5;
        assert!(matches!(
            store.save(&changed).await,
            Err(SnapshotError::Unavailable(_))
        ));
        assert!(store.clear().await.is_err());
        assert_eq!(store.load().await.unwrap(), Some(order()));
    }

    #[tokio::test]
    async fn test_corrupt_payload_reads_as_absent() {
        let store = MemorySnapshotStore::new();
        store.set_raw("{not json").await;
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_arc_store_delegates() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemorySnapshotStore::new());
        store.save(&order()).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
    }
}
