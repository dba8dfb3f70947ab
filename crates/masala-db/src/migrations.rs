//! Schema migrations embedded from `migrations/sqlite/` at the workspace root.
//!
//! Files are applied in sequence order and recorded in `_sqlx_migrations`.
//! Applied files are never edited; schema changes go in a new `NNN_*.sql`.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(count = MIGRATOR.migrations.len(), "Register schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    // The bookkeeping table only exists once a migration has run.
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);
    Ok((MIGRATOR.migrations.len(), applied as usize))
}
