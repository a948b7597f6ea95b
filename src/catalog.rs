//! SQLite-backed catalog store.
//!
//! [`SqliteCatalog`] owns every read and write against the `workflows`
//! table and its full-text companion `workflows_fts`. The two are kept in
//! lockstep by [`SqliteCatalog::upsert`] and [`SqliteCatalog::delete`],
//! each of which runs as a single transaction: a reader never sees a
//! relational row whose FTS row is missing or out of date.
//!
//! Query methods take a [`RecordFilter`] and return rows in a total order
//! (relevance or recency, then `id`), so that consecutive pages of the
//! same query never overlap or skip.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::db;
use crate::error::{CatalogError, CatalogResult};
use crate::migrate;
use crate::models::{
    CatalogEntry, CatalogStats, Complexity, IntegrationCount, TriggerType, WorkflowRecord,
};

/// BM25 column weights: filename, display_name, description, integrations, tags.
const BM25_WEIGHTS: &str = "2.0, 4.0, 1.0, 2.0, 1.0";

const RECORD_COLUMNS: &str = "w.id, w.filename, w.display_name, w.external_id, w.active, \
     w.description, w.trigger_type, w.complexity, w.node_count, w.connection_count, \
     w.integrations, w.tags, w.created_at, w.updated_at, w.content_fingerprint, \
     w.file_size, w.last_analyzed_at";

/// Structured filters shared by every listing query. All present filters
/// must hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub trigger: Option<TriggerType>,
    pub complexity: Option<Complexity>,
    pub active_only: bool,
}

// Each nullable filter binds its value twice: once for the IS NULL test
// and once for the comparison.
const FILTER_CLAUSE: &str = "(? IS NULL OR w.trigger_type = ?) \
     AND (? IS NULL OR w.complexity = ?) \
     AND (? = 0 OR w.active = 1)";

pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Open (creating if needed) the catalog at `db_path` and ensure the schema.
    pub async fn open(db_path: &Path) -> CatalogResult<Self> {
        let pool = db::connect(db_path).await?;
        migrate::apply_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Every stored fingerprint keyed by filename. One query per indexing run.
    pub async fn fingerprints(&self) -> CatalogResult<HashMap<String, String>> {
        let rows = sqlx::query("SELECT filename, content_fingerprint FROM workflows")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| {
                (
                    row.get::<String, _>("filename"),
                    row.get::<String, _>("content_fingerprint"),
                )
            })
            .collect())
    }

    /// Insert or replace the record for `entry.filename` together with its
    /// full-text row. Returns the record id, which is preserved across
    /// replacements.
    pub async fn upsert(&self, entry: &CatalogEntry, analyzed_at_ms: i64) -> CatalogResult<i64> {
        let analysis = &entry.analysis;
        let integrations_json = to_json_list(&analysis.integrations);
        let tags_json = to_json_list(&analysis.tags);

        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM workflows WHERE filename = ?")
                .bind(&entry.filename)
                .fetch_optional(&mut *tx)
                .await?;

        if let Some(id) = existing {
            sqlx::query("DELETE FROM workflows_fts WHERE rowid = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO workflows (filename, display_name, external_id, active, description,
                                   trigger_type, complexity, node_count, connection_count,
                                   integrations, tags, created_at, updated_at,
                                   content_fingerprint, file_size, last_analyzed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(filename) DO UPDATE SET
                display_name = excluded.display_name,
                external_id = excluded.external_id,
                active = excluded.active,
                description = excluded.description,
                trigger_type = excluded.trigger_type,
                complexity = excluded.complexity,
                node_count = excluded.node_count,
                connection_count = excluded.connection_count,
                integrations = excluded.integrations,
                tags = excluded.tags,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at,
                content_fingerprint = excluded.content_fingerprint,
                file_size = excluded.file_size,
                last_analyzed_at = excluded.last_analyzed_at
            RETURNING id
            "#,
        )
        .bind(&entry.filename)
        .bind(&analysis.display_name)
        .bind(&analysis.external_id)
        .bind(analysis.active)
        .bind(&analysis.description)
        .bind(analysis.trigger_type.as_str())
        .bind(analysis.complexity.as_str())
        .bind(analysis.node_count as i64)
        .bind(analysis.connection_count as i64)
        .bind(&integrations_json)
        .bind(&tags_json)
        .bind(&analysis.created_at)
        .bind(&analysis.updated_at)
        .bind(&entry.content_fingerprint)
        .bind(entry.file_size as i64)
        .bind(analyzed_at_ms)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO workflows_fts (rowid, filename, display_name, description, integrations, tags) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&entry.filename)
        .bind(&analysis.display_name)
        .bind(&analysis.description)
        .bind(analysis.integrations.join(" "))
        .bind(analysis.tags.join(" "))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Remove the record for `filename` and its full-text row.
    /// Returns whether a record existed.
    pub async fn delete(&self, filename: &str) -> CatalogResult<bool> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM workflows WHERE filename = ?")
                .bind(filename)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(id) = existing else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM workflows_fts WHERE rowid = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn filenames(&self) -> CatalogResult<Vec<String>> {
        let names = sqlx::query_scalar("SELECT filename FROM workflows ORDER BY filename")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    pub async fn get(&self, filename: &str) -> CatalogResult<Option<WorkflowRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM workflows w WHERE w.filename = ?");
        let row = sqlx::query(&sql)
            .bind(filename)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    /// One page of records matching an FTS5 `match_expr`, best relevance
    /// first, plus the size of the whole matching set.
    ///
    /// The count and the page are read inside one transaction, so both see
    /// the same snapshot even while an indexing run commits.
    pub async fn query_ranked(
        &self,
        match_expr: &str,
        filter: &RecordFilter,
        limit: i64,
        offset: i64,
    ) -> CatalogResult<(Vec<WorkflowRecord>, i64)> {
        let count_sql = format!(
            "SELECT COUNT(*) FROM workflows_fts JOIN workflows w ON w.id = workflows_fts.rowid \
             WHERE workflows_fts MATCH ? AND {FILTER_CLAUSE}"
        );
        let sql = format!(
            "SELECT {RECORD_COLUMNS}, bm25(workflows_fts, {BM25_WEIGHTS}) AS score \
             FROM workflows_fts JOIN workflows w ON w.id = workflows_fts.rowid \
             WHERE workflows_fts MATCH ? AND {FILTER_CLAUSE} \
             ORDER BY score, w.id \
             LIMIT ? OFFSET ?"
        );

        let mut tx = self.pool.begin().await?;
        let total: i64 = bind_filter(sqlx::query(&count_sql).bind(match_expr), filter)
            .fetch_one(&mut *tx)
            .await?
            .get(0);
        let rows = bind_filter(sqlx::query(&sql).bind(match_expr), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let records = rows
            .iter()
            .map(row_to_record)
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok((records, total))
    }

    /// One page of records passing `filter`, most recently analyzed first,
    /// plus the size of the filtered set. Read like [`Self::query_ranked`].
    pub async fn query_recent(
        &self,
        filter: &RecordFilter,
        limit: i64,
        offset: i64,
    ) -> CatalogResult<(Vec<WorkflowRecord>, i64)> {
        let count_sql = format!("SELECT COUNT(*) FROM workflows w WHERE {FILTER_CLAUSE}");
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM workflows w WHERE {FILTER_CLAUSE} \
             ORDER BY w.last_analyzed_at DESC, w.id DESC \
             LIMIT ? OFFSET ?"
        );

        let mut tx = self.pool.begin().await?;
        let total: i64 = bind_filter(sqlx::query(&count_sql), filter)
            .fetch_one(&mut *tx)
            .await?
            .get(0);
        let rows = bind_filter(sqlx::query(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let records = rows
            .iter()
            .map(row_to_record)
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok((records, total))
    }

    /// Records whose integrations include at least one of `services`, most
    /// recently analyzed first, plus the size of the whole matching set.
    pub async fn query_containing_any(
        &self,
        services: &[&str],
        limit: i64,
        offset: i64,
    ) -> CatalogResult<(Vec<WorkflowRecord>, i64)> {
        if services.is_empty() {
            return Ok((Vec::new(), 0));
        }

        // Integrations are stored as a JSON array of strings, so an exact
        // member always appears quoted.
        let patterns: Vec<String> = services.iter().map(|s| format!("%\"{}\"%", s)).collect();
        let clause = vec!["w.integrations LIKE ?"; services.len()].join(" OR ");

        let count_sql = format!("SELECT COUNT(*) FROM workflows w WHERE {clause}");
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM workflows w WHERE {clause} \
             ORDER BY w.last_analyzed_at DESC, w.id DESC \
             LIMIT ? OFFSET ?"
        );

        let mut tx = self.pool.begin().await?;

        let mut count_query = sqlx::query(&count_sql);
        for p in &patterns {
            count_query = count_query.bind(p);
        }
        let total: i64 = count_query.fetch_one(&mut *tx).await?.get(0);

        let mut query = sqlx::query(&sql);
        for p in &patterns {
            query = query.bind(p);
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let records = rows
            .iter()
            .map(row_to_record)
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok((records, total))
    }

    /// Every record, ordered by filename.
    pub async fn all_records(&self) -> CatalogResult<Vec<WorkflowRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM workflows w ORDER BY w.filename");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    /// Usage count per integration across the catalog, most used first.
    pub async fn integration_counts(&self) -> CatalogResult<Vec<IntegrationCount>> {
        let rows = sqlx::query("SELECT filename, integrations FROM workflows")
            .fetch_all(&self.pool)
            .await?;

        let mut counts: HashMap<String, i64> = HashMap::new();
        for row in &rows {
            let filename: String = row.get("filename");
            let raw: String = row.get("integrations");
            for name in parse_json_list(&filename, "integrations", &raw)? {
                *counts.entry(name).or_insert(0) += 1;
            }
        }

        let mut counts: Vec<IntegrationCount> = counts
            .into_iter()
            .map(|(name, count)| IntegrationCount { name, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        Ok(counts)
    }

    pub async fn stats(&self, top_n: usize) -> CatalogResult<CatalogStats> {
        let totals = sqlx::query(
            "SELECT COUNT(*) AS total, \
                    COALESCE(SUM(active), 0) AS active, \
                    COALESCE(SUM(node_count), 0) AS nodes, \
                    COALESCE(SUM(connection_count), 0) AS connections, \
                    MAX(last_analyzed_at) AS last_analyzed \
             FROM workflows",
        )
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = totals.get("total");
        let active: i64 = totals.get("active");

        let triggers = grouped_counts(&self.pool, "trigger_type").await?;
        let complexity = grouped_counts(&self.pool, "complexity").await?;

        let integrations = self.integration_counts().await?;
        let unique_integrations = integrations.len();
        let top_integrations = integrations.into_iter().take(top_n).collect();

        Ok(CatalogStats {
            total,
            active,
            inactive: total - active,
            triggers,
            complexity,
            total_nodes: totals.get("nodes"),
            total_connections: totals.get("connections"),
            unique_integrations,
            top_integrations,
            last_analyzed_at: totals.get("last_analyzed"),
        })
    }
}

async fn grouped_counts(pool: &SqlitePool, column: &str) -> CatalogResult<BTreeMap<String, i64>> {
    let sql = format!("SELECT {column} AS bucket, COUNT(*) AS n FROM workflows GROUP BY {column}");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>("bucket"), row.get::<i64, _>("n")))
        .collect())
}

fn bind_filter<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &RecordFilter,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    let trigger = filter.trigger.map(|t| t.as_str());
    let complexity = filter.complexity.map(|c| c.as_str());
    query
        .bind(trigger)
        .bind(trigger)
        .bind(complexity)
        .bind(complexity)
        .bind(filter.active_only)
}

fn to_json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn parse_json_list(filename: &str, column: &str, raw: &str) -> CatalogResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| CatalogError::CorruptRow {
        filename: filename.to_string(),
        reason: format!("{column}: {e}"),
    })
}

fn row_to_record(row: &SqliteRow) -> CatalogResult<WorkflowRecord> {
    let filename: String = row.get("filename");

    let corrupt = |reason: String| CatalogError::CorruptRow {
        filename: filename.clone(),
        reason,
    };

    let trigger_type = row
        .get::<String, _>("trigger_type")
        .parse::<TriggerType>()
        .map_err(corrupt)?;
    let complexity = row
        .get::<String, _>("complexity")
        .parse::<Complexity>()
        .map_err(corrupt)?;
    let integrations = parse_json_list(&filename, "integrations", row.get("integrations"))?;
    let tags = parse_json_list(&filename, "tags", row.get("tags"))?;

    Ok(WorkflowRecord {
        id: row.get("id"),
        display_name: row.get("display_name"),
        external_id: row.get("external_id"),
        active: row.get("active"),
        description: row.get("description"),
        trigger_type,
        complexity,
        node_count: row.get("node_count"),
        connection_count: row.get("connection_count"),
        integrations,
        tags,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        content_fingerprint: row.get("content_fingerprint"),
        file_size: row.get("file_size"),
        last_analyzed_at: row.get("last_analyzed_at"),
        filename,
    })
}
