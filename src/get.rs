//! Workflow retrieval by filename.
//!
//! Fetches one catalog record and compares the stored fingerprint with the
//! file currently on disk. A query can legitimately serve a record whose
//! source changed after the last indexing run; `flowcat get` makes that
//! visible instead of hiding it.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::catalog::SqliteCatalog;
use crate::config::Config;
use crate::error::CatalogResult;
use crate::fingerprint;
use crate::models::WorkflowRecord;

/// How a stored record relates to its source file right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// On-disk bytes hash to the stored fingerprint.
    Fresh,
    /// The file changed since it was last analyzed.
    Stale,
    /// The file no longer exists under the corpus root.
    Missing,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::Stale => "stale",
            Freshness::Missing => "missing",
        }
    }
}

pub async fn get_by_filename(
    catalog: &SqliteCatalog,
    filename: &str,
) -> CatalogResult<Option<WorkflowRecord>> {
    catalog.get(filename).await
}

/// Resolve a catalog filename to a path inside `root`.
///
/// Rejects absolute paths and any `..` component so a lookup can never
/// read outside the corpus.
pub fn resolve_source_path(root: &Path, filename: &str) -> Result<PathBuf> {
    let relative = Path::new(filename);
    if filename.is_empty()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        bail!("invalid workflow filename: {}", filename);
    }

    let path = root.join(relative);
    if path.exists() {
        let canonical_root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve corpus root: {}", root.display()))?;
        let canonical = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        if !canonical.starts_with(&canonical_root) {
            bail!("workflow path escapes the corpus root: {}", filename);
        }
    }
    Ok(path)
}

pub fn freshness(root: &Path, record: &WorkflowRecord) -> Result<Freshness> {
    let path = resolve_source_path(root, &record.filename)?;
    if !path.is_file() {
        return Ok(Freshness::Missing);
    }
    let stale = fingerprint::needs_reanalysis(&path, Some(&record.content_fingerprint), false)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(if stale {
        Freshness::Stale
    } else {
        Freshness::Fresh
    })
}

#[derive(Serialize)]
struct GetOutput<'a> {
    #[serde(flatten)]
    record: &'a WorkflowRecord,
    freshness: Freshness,
}

/// `flowcat get <FILENAME>`.
pub async fn run_get(config: &Config, filename: &str, raw: bool, json: bool) -> Result<()> {
    let catalog = SqliteCatalog::open(&config.db.path).await?;
    let record = get_by_filename(&catalog, filename).await;
    catalog.close().await;

    let Some(record) = record? else {
        bail!("workflow not found: {}", filename);
    };

    let root = &config.corpus.root;
    let status = freshness(root, &record)?;

    if raw {
        if status == Freshness::Missing {
            bail!("source file is missing: {}", filename);
        }
        let path = resolve_source_path(root, filename)?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        println!("{}", content.trim_end());
        return Ok(());
    }

    if json {
        let output = GetOutput {
            record: &record,
            freshness: status,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("--- Workflow ---");
    println!("id:           {}", record.id);
    println!("filename:     {}", record.filename);
    println!("name:         {}", record.display_name);
    if !record.external_id.is_empty() {
        println!("external_id:  {}", record.external_id);
    }
    println!("active:       {}", record.active);
    println!("trigger:      {}", record.trigger_type);
    println!("complexity:   {}", record.complexity);
    println!("nodes:        {}", record.node_count);
    println!("connections:  {}", record.connection_count);
    println!("integrations: {}", record.integrations.join(", "));
    println!("tags:         {}", record.tags.join(", "));
    if !record.created_at.is_empty() {
        println!("created_at:   {}", record.created_at);
    }
    if !record.updated_at.is_empty() {
        println!("updated_at:   {}", record.updated_at);
    }
    println!("analyzed_at:  {}", format_ms_iso(record.last_analyzed_at));
    println!("size:         {} bytes", record.file_size);
    println!("source:       {}", status.as_str());
    println!();
    println!("--- Description ---");
    println!("{}", record.description);

    Ok(())
}

fn format_ms_iso(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ms.to_string())
}
