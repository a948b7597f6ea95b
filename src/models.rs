//! Core data models used throughout the catalog.
//!
//! These types represent the analysis of one workflow document, the record
//! persisted for it, and the aggregate results of indexing and querying.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What starts a workflow's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TriggerType {
    Manual,
    Webhook,
    Scheduled,
    Complex,
}

impl TriggerType {
    pub const ALL: [TriggerType; 4] = [
        TriggerType::Manual,
        TriggerType::Webhook,
        TriggerType::Scheduled,
        TriggerType::Complex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Manual => "Manual",
            TriggerType::Webhook => "Webhook",
            TriggerType::Scheduled => "Scheduled",
            TriggerType::Complex => "Complex",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriggerType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown trigger type: '{}'. Use Manual, Webhook, Scheduled, or Complex.",
                    s
                )
            })
    }
}

/// Size tier of a workflow, derived from its node count alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Complexity::Low, Complexity::Medium, Complexity::High];

    /// `low` up to 5 nodes, `medium` up to 15, `high` beyond.
    pub fn from_node_count(node_count: usize) -> Self {
        if node_count <= 5 {
            Complexity::Low
        } else if node_count <= 15 {
            Complexity::Medium
        } else {
            Complexity::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Complexity::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown complexity: '{}'. Use low, medium, or high.", s))
    }
}

/// Everything the analyzer derives from one document's bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowAnalysis {
    pub display_name: String,
    pub external_id: String,
    pub active: bool,
    pub description: String,
    pub trigger_type: TriggerType,
    pub complexity: Complexity,
    pub node_count: usize,
    pub connection_count: usize,
    /// Canonical service names, sorted and de-duplicated.
    pub integrations: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// An analysis plus the file facts needed to persist it.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Path relative to the corpus root, `/`-separated. Stable identity.
    pub filename: String,
    pub content_fingerprint: String,
    pub file_size: u64,
    pub analysis: WorkflowAnalysis,
}

/// A catalog row as served to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRecord {
    pub id: i64,
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
    #[serde(skip)]
    pub content_fingerprint: String,
    pub file_size: i64,
    /// Unix milliseconds.
    pub last_analyzed_at: i64,
}

/// Aggregate counts from one indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub processed: u64,
    pub skipped: u64,
    pub errors: u64,
    pub removed: u64,
}

/// One page of query results plus the size of the whole filtered set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchPage {
    pub records: Vec<WorkflowRecord>,
    pub total: i64,
}

impl SearchPage {
    /// Number of pages of `per_page` records needed to cover `total`.
    pub fn page_count(&self, per_page: i64) -> i64 {
        if per_page <= 0 {
            return 0;
        }
        (self.total + per_page - 1) / per_page
    }
}

/// How many records use one integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationCount {
    pub name: String,
    pub count: i64,
}

/// Catalog-wide aggregates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub triggers: BTreeMap<String, i64>,
    pub complexity: BTreeMap<String, i64>,
    pub total_nodes: i64,
    pub total_connections: i64,
    pub unique_integrations: usize,
    /// Most used integrations first; ties by name.
    pub top_integrations: Vec<IntegrationCount>,
    /// Most recent analysis time, Unix milliseconds.
    pub last_analyzed_at: Option<i64>,
}
