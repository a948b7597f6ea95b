//! Document analysis: one workflow JSON file in, one [`WorkflowAnalysis`] out.
//!
//! The analyzer is pure (no I/O) and lenient about shape: any missing or
//! oddly-typed field falls back to an empty default. Only bytes that are not
//! a JSON object at all are rejected, as [`AnalyzeError::Malformed`].

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::AnalyzeError;
use crate::models::{Complexity, TriggerType, WorkflowAnalysis};
use crate::services::{self, capitalize};

/// Declared names starting with this are editor defaults, not real names.
const PLACEHOLDER_NAME_PREFIX: &str = "My workflow";

/// Tokens upper-cased verbatim when building a name from a filename.
const ACRONYMS: &[&str] = &["HTTP", "API"];

/// Workflows above this many nodes *and* integrations count as `Complex`.
const COMPLEX_MIN_NODES: usize = 10;
const COMPLEX_MIN_INTEGRATIONS: usize = 3;

/// Integrations named explicitly in a synthesized description.
const DESCRIPTION_MAX_SERVICES: usize = 3;

/// One node of the workflow graph, as far as the analyzer cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NodeInfo {
    node_type: String,
    name: String,
}

/// Analyze raw document bytes. `filename` is the corpus-relative path.
pub fn analyze_document(filename: &str, bytes: &[u8]) -> Result<WorkflowAnalysis, AnalyzeError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| AnalyzeError::malformed(filename, e.to_string()))?;

    let doc = value.as_object().ok_or_else(|| {
        AnalyzeError::malformed(filename, "top-level JSON value is not an object")
    })?;

    let nodes = read_nodes(doc);
    let node_count = doc
        .get("nodes")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    let display_name = resolve_display_name(&str_field(doc, "name"), base_name(filename));
    let integrations = extract_integrations(&nodes);
    let trigger_type = classify_trigger(&nodes, node_count, integrations.len());
    let complexity = Complexity::from_node_count(node_count);

    let declared_description = str_field(doc, "description");
    let description = if declared_description.trim().is_empty() {
        synthesize_description(&display_name, trigger_type, &integrations, node_count)
    } else {
        declared_description.trim().to_string()
    };

    Ok(WorkflowAnalysis {
        display_name,
        external_id: scalar_field(doc, "id"),
        active: doc.get("active").and_then(Value::as_bool).unwrap_or(false),
        description,
        trigger_type,
        complexity,
        node_count,
        connection_count: count_connections(doc.get("connections")),
        integrations,
        tags: normalize_tags(doc.get("tags")),
        created_at: str_field(doc, "createdAt"),
        updated_at: str_field(doc, "updatedAt"),
    })
}

fn str_field(doc: &Map<String, Value>, key: &str) -> String {
    doc.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Like [`str_field`] but also accepts numbers (some exports use numeric ids).
fn scalar_field(doc: &Map<String, Value>, key: &str) -> String {
    match doc.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn read_nodes(doc: &Map<String, Value>) -> Vec<NodeInfo> {
    doc.get("nodes")
        .and_then(Value::as_array)
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(Value::as_object)
                .map(|node| NodeInfo {
                    node_type: str_field(node, "type"),
                    name: str_field(node, "name"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Count `{node: ...}` edges under `connections[source].main[output][i]`.
fn count_connections(connections: Option<&Value>) -> usize {
    let Some(sources) = connections.and_then(Value::as_object) else {
        return 0;
    };

    sources
        .values()
        .filter_map(|source| source.get("main").and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_array)
        .flatten()
        .filter(|edge| edge.get("node").and_then(Value::as_str).is_some())
        .count()
}

fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// Prefer the declared name unless it is empty, the bare file stem, or an
/// editor placeholder; otherwise derive one from the filename.
pub fn resolve_display_name(declared: &str, filename: &str) -> String {
    let declared = declared.trim();
    let stem = filename.strip_suffix(".json").unwrap_or(filename);

    if !declared.is_empty() && declared != stem && !declared.starts_with(PLACEHOLDER_NAME_PREFIX)
    {
        return declared.to_string();
    }

    title_from_filename(filename)
}

/// `1234_slack_http_Webhook.json` → `Slack HTTP Webhook`.
pub fn title_from_filename(filename: &str) -> String {
    let stem = filename.strip_suffix(".json").unwrap_or(filename);
    let mut parts: Vec<&str> = stem.split('_').collect();

    let leading_id = parts
        .first()
        .is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if parts.len() > 1 && leading_id {
        parts.remove(0);
    }

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|part| {
            ACRONYMS
                .iter()
                .find(|a| a.eq_ignore_ascii_case(part))
                .map(|a| a.to_string())
                .unwrap_or_else(|| capitalize(part))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Per-node trigger signals in document order, then the `Complex` escalation.
///
/// Within a node, a `webhook` mention beats a schedule type, which beats a
/// generic trigger type. Across nodes the last webhook or schedule signal
/// wins; a generic trigger only upgrades a still-`Manual` workflow.
fn classify_trigger(
    nodes: &[NodeInfo],
    node_count: usize,
    integration_count: usize,
) -> TriggerType {
    let mut trigger = TriggerType::Manual;

    for node in nodes {
        let node_type = node.node_type.to_lowercase();
        let name = node.name.to_lowercase();

        if node_type.contains("webhook") || name.contains("webhook") {
            trigger = TriggerType::Webhook;
        } else if node_type.contains("cron") || node_type.contains("schedule") {
            trigger = TriggerType::Scheduled;
        } else if node_type.contains("trigger")
            && !node_type.contains("manual")
            && trigger == TriggerType::Manual
        {
            trigger = TriggerType::Webhook;
        }
    }

    if node_count > COMPLEX_MIN_NODES && integration_count > COMPLEX_MIN_INTEGRATIONS {
        trigger = TriggerType::Complex;
    }

    trigger
}

fn extract_integrations(nodes: &[NodeInfo]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|node| services::resolve_node_service(&node.node_type, &node.name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Build a one-sentence summary when the document declares none.
pub fn synthesize_description(
    display_name: &str,
    trigger: TriggerType,
    integrations: &[String],
    node_count: usize,
) -> String {
    let mut desc = String::from(match trigger {
        TriggerType::Webhook => "Webhook-triggered automation that",
        TriggerType::Scheduled => "Scheduled automation that",
        TriggerType::Complex => "Complex multi-step automation that",
        TriggerType::Manual => "Manual workflow that",
    });

    let named: Vec<&str> = integrations
        .iter()
        .take(DESCRIPTION_MAX_SERVICES)
        .map(String::as_str)
        .collect();
    match named.as_slice() {
        [] => {}
        [only] => desc.push_str(&format!(" integrates with {}", only)),
        [first, second] => desc.push_str(&format!(" connects {} and {}", first, second)),
        [init @ .., last] => {
            desc.push_str(&format!(" orchestrates {}, and {}", init.join(", "), last))
        }
    }

    let name = display_name.to_lowercase();
    desc.push_str(if name.contains("create") {
        " to create new records"
    } else if name.contains("update") {
        " to update existing data"
    } else if name.contains("sync") {
        " to synchronize data"
    } else if name.contains("notif") || name.contains("alert") {
        " for notifications and alerts"
    } else if name.contains("backup") {
        " for data backup operations"
    } else if name.contains("monitor") {
        " for monitoring and reporting"
    } else {
        " for data processing"
    });

    desc.push_str(&format!(". Uses {} nodes", node_count));
    if integrations.len() > DESCRIPTION_MAX_SERVICES {
        desc.push_str(&format!(" and integrates with {} services", integrations.len()));
    }
    desc.push('.');
    desc
}

/// Structured tags collapse to their `name`, then `id`, then `"tag"`.
fn normalize_tags(tags: Option<&Value>) -> Vec<String> {
    let Some(tags) = tags.and_then(Value::as_array) else {
        return Vec::new();
    };

    tags.iter()
        .filter_map(|tag| match tag {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => Some(
                obj.get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| match obj.get("id") {
                        Some(Value::String(s)) => Some(s.clone()),
                        Some(Value::Number(n)) => Some(n.to_string()),
                        _ => None,
                    })
                    .unwrap_or_else(|| "tag".to_string()),
            ),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(node_type: &str, name: &str) -> Value {
        json!({ "type": node_type, "name": name })
    }

    fn analyze(filename: &str, doc: Value) -> WorkflowAnalysis {
        analyze_document(filename, doc.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn slack_webhook_scenario() {
        let a = analyze(
            "1234_Slack_NotifyOnError_Webhook.json",
            json!({
                "nodes": [
                    node("n8n-nodes-base.webhook", "Webhook"),
                    node("n8n-nodes-base.slack", "Slack"),
                ],
                "connections": {
                    "Webhook": { "main": [[{ "node": "Slack", "type": "main", "index": 0 }]] }
                }
            }),
        );

        assert_eq!(a.display_name, "Slack Notifyonerror Webhook");
        assert_eq!(a.trigger_type, TriggerType::Webhook);
        assert_eq!(a.complexity, Complexity::Low);
        assert_eq!(a.node_count, 2);
        assert_eq!(a.connection_count, 1);
        assert_eq!(a.integrations, vec!["Slack"]);
        assert!(a.description.contains("Slack"), "{}", a.description);
        assert!(a.description.starts_with("Webhook-triggered automation"));
    }

    #[test]
    fn malformed_bytes_are_rejected() {
        assert!(matches!(
            analyze_document("bad.json", b"{\"nodes\": ["),
            Err(AnalyzeError::Malformed { .. })
        ));
        assert!(analyze_document("list.json", b"[1, 2]").is_err());
        assert!(analyze_document("bin.json", &[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn empty_object_gets_defaults() {
        let a = analyze("42_Empty.json", json!({}));
        assert_eq!(a.display_name, "Empty");
        assert_eq!(a.node_count, 0);
        assert_eq!(a.trigger_type, TriggerType::Manual);
        assert!(!a.active);
        assert!(a.integrations.is_empty());
        assert!(a.tags.is_empty());
        assert_eq!(
            a.description,
            "Manual workflow that for data processing. Uses 0 nodes."
        );
    }

    #[test]
    fn declared_name_rules() {
        assert_eq!(resolve_display_name("Lead Router", "1_x.json"), "Lead Router");
        assert_eq!(
            resolve_display_name("My workflow 3", "7_api_http_sync.json"),
            "API HTTP Sync"
        );
        assert_eq!(resolve_display_name("7_sync", "7_sync.json"), "Sync");
        assert_eq!(resolve_display_name("  ", "report.json"), "Report");
    }

    #[test]
    fn numeric_only_filename_keeps_its_digits() {
        assert_eq!(title_from_filename("2024.json"), "2024");
        assert_eq!(title_from_filename("0001__gmail_backup.json"), "Gmail Backup");
    }

    #[test]
    fn only_utility_nodes_yield_no_integrations() {
        let a = analyze(
            "utility.json",
            json!({ "nodes": [
                node("n8n-nodes-base.if", "Check"),
                node("n8n-nodes-base.merge", "Merge"),
                node("n8n-nodes-base.code", "Transform"),
                node("n8n-nodes-base.manualTrigger", "Start"),
            ]}),
        );
        assert!(a.integrations.is_empty());
        assert_eq!(a.trigger_type, TriggerType::Manual);
    }

    #[test]
    fn trigger_precedence_follows_document_order() {
        let a = analyze(
            "t.json",
            json!({ "nodes": [
                node("n8n-nodes-base.webhook", "Hook"),
                node("n8n-nodes-base.scheduleTrigger", "Every hour"),
            ]}),
        );
        assert_eq!(a.trigger_type, TriggerType::Scheduled);

        let b = analyze(
            "t.json",
            json!({ "nodes": [
                node("n8n-nodes-base.scheduleTrigger", "webhook fallback"),
            ]}),
        );
        assert_eq!(b.trigger_type, TriggerType::Webhook);

        let c = analyze(
            "t.json",
            json!({ "nodes": [
                node("n8n-nodes-base.cron", "Nightly"),
                node("n8n-nodes-base.telegramTrigger", "On message"),
            ]}),
        );
        assert_eq!(c.trigger_type, TriggerType::Scheduled);

        let d = analyze(
            "t.json",
            json!({ "nodes": [node("n8n-nodes-base.telegramTrigger", "On message")]}),
        );
        assert_eq!(d.trigger_type, TriggerType::Webhook);
    }

    #[test]
    fn many_nodes_and_services_escalate_to_complex() {
        let services = ["slack", "gmail", "notion", "airtable", "stripe"];
        let mut nodes = vec![node("n8n-nodes-base.scheduleTrigger", "Schedule")];
        for i in 0..19 {
            nodes.push(node(
                &format!("n8n-nodes-base.{}", services[i % services.len()]),
                &format!("Step {}", i),
            ));
        }

        let a = analyze("big.json", json!({ "nodes": nodes }));
        assert_eq!(a.node_count, 20);
        assert_eq!(a.integrations.len(), 5);
        assert_eq!(a.trigger_type, TriggerType::Complex);
        assert_eq!(a.complexity, Complexity::High);
        assert!(a.description.ends_with("and integrates with 5 services."));
    }

    #[test]
    fn description_phrasing_by_service_count() {
        let two = vec!["Gmail".to_string(), "Slack".to_string()];
        assert_eq!(
            synthesize_description("Backup mail", TriggerType::Scheduled, &two, 4),
            "Scheduled automation that connects Gmail and Slack for data backup operations. Uses 4 nodes."
        );

        let three = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(
            synthesize_description("Create leads", TriggerType::Manual, &three, 9),
            "Manual workflow that orchestrates A, B, and C to create new records. Uses 9 nodes."
        );
    }

    #[test]
    fn declared_description_is_used_verbatim() {
        let a = analyze(
            "x.json",
            json!({ "description": "Hand written", "nodes": [] }),
        );
        assert_eq!(a.description, "Hand written");
    }

    #[test]
    fn tags_are_normalized() {
        let a = analyze(
            "x.json",
            json!({ "tags": [
                "plain",
                { "id": "7", "name": "named" },
                { "id": 12 },
                { "color": "red" },
                null
            ]}),
        );
        assert_eq!(a.tags, vec!["plain", "named", "12", "tag"]);
    }

    #[test]
    fn header_fields_are_carried() {
        let a = analyze(
            "x.json",
            json!({
                "id": 991,
                "active": true,
                "createdAt": "2024-01-02T03:04:05.000Z",
                "updatedAt": "2024-02-02T03:04:05.000Z"
            }),
        );
        assert_eq!(a.external_id, "991");
        assert!(a.active);
        assert_eq!(a.created_at, "2024-01-02T03:04:05.000Z");
        assert_eq!(a.updated_at, "2024-02-02T03:04:05.000Z");
    }
}
