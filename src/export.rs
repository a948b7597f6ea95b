//! Export the catalog as a static JSON search index.
//!
//! Produces one JSON document holding catalog stats, the category keys,
//! the most used integrations, and every record tagged with its category.
//! A static site can load it and search client-side without a server.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::catalog::SqliteCatalog;
use crate::config::Config;
use crate::models::{CatalogStats, Complexity, IntegrationCount, TriggerType, WorkflowRecord};
use crate::services;

const EXPORT_VERSION: &str = "1.0";

/// Integrations listed in the export.
const EXPORT_TOP_INTEGRATIONS: usize = 50;

#[derive(Debug, Serialize)]
pub struct ExportIndex {
    pub version: &'static str,
    pub generated_at: String,
    pub stats: CatalogStats,
    pub categories: Vec<&'static str>,
    pub integrations: Vec<IntegrationCount>,
    pub workflows: Vec<ExportWorkflow>,
}

/// One exported record. `id` is the filename without `.json`; the catalog's
/// numeric key is kept as `record_id`.
#[derive(Debug, Serialize)]
pub struct ExportWorkflow {
    pub id: String,
    pub record_id: i64,
    pub filename: String,
    pub display_name: String,
    pub external_id: String,
    pub active: bool,
    pub description: String,
    pub trigger_type: TriggerType,
    pub complexity: Complexity,
    pub node_count: i64,
    pub connection_count: i64,
    pub integrations: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub file_size: i64,
    pub last_analyzed_at: i64,
    pub category: &'static str,
    pub searchable_text: String,
}

impl ExportWorkflow {
    fn from_record(record: WorkflowRecord) -> Self {
        let id = record
            .filename
            .strip_suffix(".json")
            .unwrap_or(&record.filename)
            .to_string();
        let category = services::category_for(&record.integrations)
            .unwrap_or(services::UNCATEGORIZED);
        let searchable_text = format!(
            "{} {} {} {} {}",
            record.display_name,
            record.description,
            record.filename,
            record.integrations.join(" "),
            record.tags.join(" ")
        )
        .to_lowercase();

        Self {
            id,
            record_id: record.id,
            filename: record.filename,
            display_name: record.display_name,
            external_id: record.external_id,
            active: record.active,
            description: record.description,
            trigger_type: record.trigger_type,
            complexity: record.complexity,
            node_count: record.node_count,
            connection_count: record.connection_count,
            integrations: record.integrations,
            tags: record.tags,
            created_at: record.created_at,
            updated_at: record.updated_at,
            file_size: record.file_size,
            last_analyzed_at: record.last_analyzed_at,
            category,
            searchable_text,
        }
    }
}

/// Build the export document from an open catalog.
pub async fn build_export(catalog: &SqliteCatalog) -> Result<ExportIndex> {
    let stats = catalog.stats(EXPORT_TOP_INTEGRATIONS).await?;
    let records = catalog.all_records().await?;

    let generated_at = stats
        .last_analyzed_at
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();

    Ok(ExportIndex {
        version: EXPORT_VERSION,
        generated_at,
        categories: services::CATEGORIES.iter().map(|(key, _)| *key).collect(),
        integrations: stats.top_integrations.clone(),
        stats,
        workflows: records.into_iter().map(ExportWorkflow::from_record).collect(),
    })
}

/// Export the catalog as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let catalog = SqliteCatalog::open(&config.db.path).await?;
    let export = build_export(&catalog).await;
    catalog.close().await;
    let export = export?;

    let json = serde_json::to_string_pretty(&export)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} workflows to {}",
                export.workflows.len(),
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, integrations: &[&str]) -> WorkflowRecord {
        WorkflowRecord {
            id: 1,
            filename: filename.to_string(),
            display_name: "Slack Alert".to_string(),
            external_id: String::new(),
            active: true,
            description: "Webhook workflow".to_string(),
            trigger_type: TriggerType::Webhook,
            complexity: Complexity::Low,
            node_count: 2,
            connection_count: 1,
            integrations: integrations.iter().map(|s| s.to_string()).collect(),
            tags: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
            content_fingerprint: "fp".to_string(),
            file_size: 10,
            last_analyzed_at: 0,
        }
    }

    #[test]
    fn workflow_gets_id_category_and_search_text() {
        let w = ExportWorkflow::from_record(record("Slack/0001_alert.json", &["Slack"]));
        assert_eq!(w.id, "Slack/0001_alert");
        assert_eq!(w.category, "messaging");
        assert!(w.searchable_text.contains("slack alert"));
    }

    #[test]
    fn unknown_services_are_uncategorized() {
        let w = ExportWorkflow::from_record(record("x.json", &["Acme"]));
        assert_eq!(w.category, services::UNCATEGORIZED);
    }

    #[test]
    fn serialized_workflow_has_one_id_key() {
        let mut r = record("Slack/0001_alert.json", &["Slack"]);
        r.id = 7;
        let json = serde_json::to_string(&ExportWorkflow::from_record(r)).unwrap();
        assert_eq!(json.matches("\"id\":").count(), 1);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], "Slack/0001_alert");
        assert_eq!(value["record_id"], 7);
    }

    #[test]
    fn fingerprint_is_not_exported() {
        let w = ExportWorkflow::from_record(record("x.json", &[]));
        let value = serde_json::to_value(&w).unwrap();
        assert!(value.get("content_fingerprint").is_none());
        assert_eq!(value["filename"], "x.json");
    }
}
