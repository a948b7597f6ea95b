//! SQLite database connection management.
//!
//! Every indexing run and every query opens its own pool and closes it when
//! done; no connection outlives the command that created it.
//!
//! # Write-Ahead Logging (WAL)
//!
//! WAL mode lets one indexing run write while any number of queries read,
//! without readers waiting on the writer. `synchronous = NORMAL` is safe
//! under WAL and keeps per-file commits cheap.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;

use crate::error::{CatalogError, CatalogResult};

/// Create a connection pool to the catalog database at `db_path`.
///
/// - Creates the database file and parent directories if they don't exist.
/// - Enables WAL journal mode for concurrent read/write.
/// - Waits at most five seconds on a locked database before failing.
pub async fn connect(db_path: &Path) -> CatalogResult<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| CatalogError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
