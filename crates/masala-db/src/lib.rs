//! # masala-db: Local Persistence for Masala POS
//!
//! Keeps the in-progress order on disk so a crash or restart of the register
//! never loses a half-built cart.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Masala POS Data Flow                             │
//! │                                                                         │
//! │  BillingSession (every cart mutation)                                  │
//! │       │  snapshot captured synchronously, then awaited write            │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     masala-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐   ┌──────────────┐ │   │
//! │  │   │ SnapshotStore │    │ PendingOrderRepo │   │  Migrations  │ │   │
//! │  │   │   (trait)     │◄───│ MemorySnapshot   │   │  (embedded)  │ │   │
//! │  │   │ save/load/    │    │   Store          │   │ 001_pending_ │ │   │
//! │  │   │ clear         │    │                  │   │  orders.sql  │ │   │
//! │  │   └───────────────┘    └──────────────────┘   └──────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite database (WAL)  <data dir>/masala.db                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and snapshot error types
//! - [`store`] - The `SnapshotStore` trait and the in-memory store
//! - [`repository`] - SQLite repository for the pending-order snapshot
//!
//! ## Usage
//!
//! ```rust,ignore
//! use masala_db::{Database, DbConfig, SnapshotStore};
//!
//! let db = Database::new(DbConfig::new("masala.db")).await?;
//! let store = db.pending_orders();
//!
//! store.save(&ledger.snapshot()).await?;
//! if let Some(order) = store.load().await? {
//!     ledger.restore(order);
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, SnapshotError};
pub use pool::{Database, DbConfig};
pub use repository::pending_order::PendingOrderRepository;
pub use store::{MemorySnapshotStore, SnapshotStore};
