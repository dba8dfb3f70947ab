//! # Register Database
//!
//! Opens the local SQLite file that holds the in-progress order and hands
//! out repositories over it.
//!
//! ```text
//! RegisterConfig.storage.database_path
//!        │
//!        ▼
//! DbConfig::new(path) ──► Database::new ──► embedded migrations
//!                                  │
//!                                  ▼
//!                     db.pending_orders()  (SnapshotStore)
//! ```
//!
//! File databases use WAL with NORMAL synchronous so a snapshot written
//! just before a crash is still there on the next start.

use std::path::PathBuf;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::pending_order::PendingOrderRepository;

/// Where and how to open the register database.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `None` opens a private in-memory database.
    pub database_path: Option<PathBuf>,
    /// Snapshot writes are serialized by the session, so two is plenty.
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// How long SQLite waits on a locked file before failing a write.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: Some(path.into()),
            max_connections: 2,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Single-connection in-memory database. Data is lost when the pool closes.
    pub fn in_memory() -> Self {
        Self {
            database_path: None,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(1),
            run_migrations: true,
        }
    }

    pub fn without_migrations(mut self) -> Self {
        self.run_migrations = false;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.database_path {
            None => SqliteConnectOptions::new().in_memory(true),
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DbError::ConnectionFailed(format!("{}: {}", parent.display(), e))
                    })?;
                }
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal)
            }
        };
        Ok(options.busy_timeout(self.busy_timeout))
    }
}

/// Handle to the register database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database and applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        match &config.database_path {
            Some(path) => info!(path = %path.display(), "Opening register database"),
            None => info!("Opening in-memory register database"),
        }

        let options = config.connect_options()?;
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout);

        // Closing the last in-memory connection drops the data with it.
        if config.database_path.is_none() {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Self { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Snapshot repository under the default lane key.
    pub fn pending_orders(&self) -> PendingOrderRepository {
        PendingOrderRepository::new(self.pool.clone())
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub async fn close(&self) {
        info!("Closing register database");
        self.pool.close().await;
    }
}
