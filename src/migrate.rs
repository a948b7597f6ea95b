//! Database schema (idempotent).
//!
//! The catalog is one relational table plus a standalone FTS5 table whose
//! `rowid` equals `workflows.id`. The FTS table is written only by
//! [`SqliteCatalog`](crate::catalog::SqliteCatalog); there are no triggers.

use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::error::CatalogResult;

/// Create all tables and indexes if they don't already exist.
pub async fn apply_schema(pool: &SqlitePool) -> CatalogResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workflows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            external_id TEXT NOT NULL DEFAULT '',
            active INTEGER NOT NULL DEFAULT 0,
            description TEXT NOT NULL DEFAULT '',
            trigger_type TEXT NOT NULL,
            complexity TEXT NOT NULL,
            node_count INTEGER NOT NULL DEFAULT 0,
            connection_count INTEGER NOT NULL DEFAULT 0,
            integrations TEXT NOT NULL DEFAULT '[]',
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL DEFAULT '',
            content_fingerprint TEXT NOT NULL,
            file_size INTEGER NOT NULL DEFAULT 0,
            last_analyzed_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='workflows_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE workflows_fts USING fts5(
                filename,
                display_name,
                description,
                integrations,
                tags
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    for ddl in [
        "CREATE INDEX IF NOT EXISTS idx_workflows_trigger_type ON workflows(trigger_type)",
        "CREATE INDEX IF NOT EXISTS idx_workflows_complexity ON workflows(complexity)",
        "CREATE INDEX IF NOT EXISTS idx_workflows_active ON workflows(active)",
        "CREATE INDEX IF NOT EXISTS idx_workflows_node_count ON workflows(node_count)",
        "CREATE INDEX IF NOT EXISTS idx_workflows_analyzed ON workflows(last_analyzed_at DESC)",
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }

    Ok(())
}

/// `flowcat init`: create the database file and schema.
pub async fn run_migrations(config: &Config) -> CatalogResult<()> {
    let pool = db::connect(&config.db.path).await?;
    let result = apply_schema(&pool).await;
    pool.close().await;
    result
}
