//! # Pending Order Repository
//!
//! SQLite storage for the in-progress order snapshot.
//!
//! ## Write-Through on Every Mutation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart mutation N                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ledger.snapshot()  ← payload captured right after mutation N           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO pending_orders ... ON CONFLICT(snapshot_key) DO UPDATE     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  single row: 'pending_order' → {"lines": [...], "customerName": ...}    │
//! │                                                                         │
//! │  Bill submitted / cart cleared → DELETE the row                        │
//! │  Register restart             → SELECT the row once, restore cart      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A row whose payload no longer parses (older build, manual edit, disk
//! damage) is logged and reported as absent, so a bad snapshot can never
//! stop the register from starting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbResult, SnapshotError};
use crate::store::SnapshotStore;
use masala_core::PendingOrder;

/// Snapshot key used by the register.
pub const DEFAULT_SNAPSHOT_KEY: &str = "pending_order";

/// Repository for the pending-order snapshot.
#[derive(Debug, Clone)]
pub struct PendingOrderRepository {
    pool: SqlitePool,
    key: String,
}

impl PendingOrderRepository {
    /// Creates a repository under the default snapshot key.
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_key(pool, DEFAULT_SNAPSHOT_KEY)
    }

    /// Creates a repository under a custom key (one per register lane).
    pub fn with_key(pool: SqlitePool, key: impl Into<String>) -> Self {
        PendingOrderRepository {
            pool,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// When the snapshot was last written, `None` if there is none.
    pub async fn updated_at(&self) -> DbResult<Option<DateTime<Utc>>> {
        let at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT updated_at FROM pending_orders WHERE snapshot_key = ?1",
        )
        .bind(&self.key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(at)
    }
}

#[async_trait]
impl SnapshotStore for PendingOrderRepository {
    async fn save(&self, order: &PendingOrder) -> Result<(), SnapshotError> {
        let payload = serde_json::to_string(order)?;
        let line_count = order.lines.len() as i64;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO pending_orders (snapshot_key, payload, line_count, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(snapshot_key) DO UPDATE SET
                payload = excluded.payload,
                line_count = excluded.line_count,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.key)
        .bind(&payload)
        .bind(line_count)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(key = %self.key, line_count, "Pending order saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<PendingOrder>, SnapshotError> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM pending_orders WHERE snapshot_key = ?1")
                .bind(&self.key)
                .fetch_optional(&self.pool)
                .await?;

        let Some(payload) = payload else {
            return Ok(None);
        };

        match serde_json::from_str::<PendingOrder>(&payload) {
            Ok(order) => Ok(Some(order)),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable pending order snapshot");
                Ok(None)
            }
        }
    }

    async fn clear(&self) -> Result<(), SnapshotError> {
        let result = sqlx::query("DELETE FROM pending_orders WHERE snapshot_key = ?1")
            .bind(&self.key)
            .execute(&self.pool)
            .await?;

        debug!(key = %self.key, removed = result.rows_affected(), "Pending order cleared");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use masala_core::{CartLine, CustomerDetails, DiscountSpec, Money, PaymentMethod};

    async fn repo() -> (Database, PendingOrderRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.pending_orders();
        (db, repo)
    }

    fn order(quantity: i64) -> PendingOrder {
        PendingOrder {
            lines: vec![
                CartLine {
                    item_id: "m1".to_string(),
                    name: "Butter Chicken".to_string(),
                    unit_price: Money::from_paise(28_000),
                    quantity,
                },
                CartLine {
                    item_id: "m2".to_string(),
                    name: "Garlic Naan".to_string(),
                    unit_price: Money::from_paise(6_050),
                    quantity: 3,
                },
            ],
            customer: CustomerDetails {
                customer_name: "Asha".to_string(),
                customer_phone: "9876543210".to_string(),
                table_number: "4".to_string(),
            },
            discount: DiscountSpec::amount(Money::from_paise(5_000)),
            payment_method: PaymentMethod::Upi,
        }
    }

    #[tokio::test]
    async fn test_absent_snapshot_is_not_an_error() {
        let (_db, repo) = repo().await;
        assert!(repo.load().await.unwrap().is_none());
        assert!(repo.updated_at().await.unwrap().is_none());
        repo.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let (_db, repo) = repo().await;

        repo.save(&order(2)).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), Some(order(2)));
        assert!(repo.updated_at().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous() {
        let (_db, repo) = repo().await;

        repo.save(&order(1)).await.unwrap();
        repo.save(&order(4)).await.unwrap();

        let loaded = repo.load().await.unwrap().unwrap();
        assert_eq!(loaded.lines[0].quantity, 4);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pending_orders")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_clear_then_load_is_absent() {
        let (_db, repo) = repo().await;

        repo.save(&order(2)).await.unwrap();
        repo.clear().await.unwrap();
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let (db, repo) = repo().await;
        let lane_two = PendingOrderRepository::with_key(db.pool().clone(), "lane-2");

        repo.save(&order(2)).await.unwrap();
        assert!(lane_two.load().await.unwrap().is_none());

        lane_two.save(&order(1)).await.unwrap();
        repo.clear().await.unwrap();
        assert_eq!(lane_two.load().await.unwrap(), Some(order(1)));
    }

    #[tokio::test]
    async fn test_corrupt_payload_reads_as_absent() {
        let (_db, repo) = repo().await;

        sqlx::query(
            "INSERT INTO pending_orders (snapshot_key, payload, line_count, updated_at) \
             VALUES (?1, '{\"lines\": 7}', 0, ?2)",
        )
        .bind(DEFAULT_SNAPSHOT_KEY)
        .bind(Utc::now())
        .execute(&repo.pool)
        .await
        .unwrap();

        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("register.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.pending_orders().save(&order(3)).await.unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(reopened.pending_orders().load().await.unwrap(), Some(order(3)));
    }
}
