//! # Storage Errors
//!
//! ```text
//! sqlx::Error ──► DbError ──┐
//!                           ├──► SnapshotError ──► session logs a warning
//! serde_json::Error ────────┘                      and keeps billing
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// The database file could not be opened or created.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Every connection is busy; usually another writer holds the file.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(e) => DbError::QueryFailed(e.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".into()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Errors from a [`SnapshotStore`](crate::store::SnapshotStore).
///
/// None of these are fatal to billing: a failed write only means the cart
/// would not survive a restart.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot storage failed: {0}")]
    Storage(#[from] DbError),

    #[error("Snapshot could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    /// The backing store refused the write (read-only, quota, disabled).
    #[error("Snapshot store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for SnapshotError {
    fn from(err: sqlx::Error) -> Self {
        SnapshotError::Storage(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_categorized() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
        assert!(matches!(
            SnapshotError::from(sqlx::Error::RowNotFound),
            SnapshotError::Storage(DbError::Internal(_))
        ));
    }
}
