use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn flowcat_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("flowcat");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let slack_dir = root.join("workflows/Slack");
    let sheets_dir = root.join("workflows/Googlesheets");
    fs::create_dir_all(&slack_dir).unwrap();
    fs::create_dir_all(&sheets_dir).unwrap();

    fs::write(
        slack_dir.join("1234_Slack_NotifyOnError_Webhook.json"),
        r#"{
  "nodes": [
    { "type": "n8n-nodes-base.webhook", "name": "Webhook" },
    { "type": "n8n-nodes-base.slack", "name": "Slack" }
  ],
  "connections": {
    "Webhook": { "main": [[{ "node": "Slack", "type": "main", "index": 0 }]] }
  }
}"#,
    )
    .unwrap();
    fs::write(
        sheets_dir.join("0002_GoogleSheets_Backup_Scheduled.json"),
        r#"{
  "name": "Nightly sheet backup",
  "active": true,
  "nodes": [
    { "type": "n8n-nodes-base.scheduleTrigger", "name": "Nightly" },
    { "type": "n8n-nodes-base.googleSheets", "name": "Read rows" },
    { "type": "n8n-nodes-base.dropbox", "name": "Upload" }
  ],
  "connections": {},
  "tags": ["backup"]
}"#,
    )
    .unwrap();
    fs::write(
        sheets_dir.join("0003_Broken.json"),
        "{ this is not json",
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/catalog.sqlite"

[corpus]
root = "{root}/workflows"
include_globs = ["**/*.json"]
exclude_globs = []

[retrieval]
default_limit = 20
max_limit = 50
"#,
        root = root.display()
    );

    let config_path = config_dir.join("flowcat.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_flowcat(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = flowcat_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("WORKFLOW_DB_PATH")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run flowcat binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_flowcat(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/catalog.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_flowcat(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_flowcat(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_index_reports_counts() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_flowcat(&config_path, &["index"]);
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("processed: 2"), "got: {}", stdout);
    assert!(stdout.contains("errors: 1"), "got: {}", stdout);
    assert!(stdout.contains("ok"));
}

#[test]
fn test_index_incremental() {
    let (tmp, config_path) = setup_test_env();

    run_flowcat(&config_path, &["index"]);

    let (stdout, _, _) = run_flowcat(&config_path, &["index"]);
    assert!(
        stdout.contains("processed: 0") && stdout.contains("skipped: 2"),
        "Expected nothing re-analyzed, got: {}",
        stdout
    );

    // Same bytes plus one: only this file is re-analyzed
    let changed = tmp
        .path()
        .join("workflows/Slack/1234_Slack_NotifyOnError_Webhook.json");
    let mut bytes = fs::read(&changed).unwrap();
    bytes.push(b'\n');
    fs::write(&changed, bytes).unwrap();

    let (stdout, _, _) = run_flowcat(&config_path, &["index"]);
    assert!(
        stdout.contains("processed: 1"),
        "Expected 1 workflow re-analyzed, got: {}",
        stdout
    );

    let (stdout, _, _) = run_flowcat(&config_path, &["index", "--force"]);
    assert!(stdout.contains("processed: 2"), "got: {}", stdout);
}

#[test]
fn test_index_prune() {
    let (tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["index"]);

    fs::remove_file(
        tmp.path()
            .join("workflows/Googlesheets/0002_GoogleSheets_Backup_Scheduled.json"),
    )
    .unwrap();

    let (stdout, _, success) = run_flowcat(&config_path, &["index", "--prune"]);
    assert!(success);
    assert!(stdout.contains("removed: 1"), "got: {}", stdout);

    let (_, stderr, success) = run_flowcat(
        &config_path,
        &["get", "Googlesheets/0002_GoogleSheets_Backup_Scheduled.json"],
    );
    assert!(!success);
    assert!(stderr.contains("not found"), "got: {}", stderr);
}

#[test]
fn test_index_fails_when_catalog_unusable() {
    let (tmp, config_path) = setup_test_env();
    // A directory where the database file should be
    fs::create_dir_all(tmp.path().join("data/catalog.sqlite")).unwrap();

    let (stdout, _, success) = run_flowcat(&config_path, &["index"]);
    assert!(!success, "index should fail, got: {}", stdout);
    assert!(!stdout.contains("ok"));

    let (_, _, success) = run_flowcat(&config_path, &["search", "slack"]);
    assert!(!success, "search should fail on an unusable catalog");
}

#[test]
fn test_search_huge_page_number() {
    let (_tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["index"]);

    let (stdout, stderr, success) =
        run_flowcat(&config_path, &["search", "--page", "9223372036854775807"]);
    assert!(success, "stderr: {}", stderr);
    assert!(stdout.contains("No results"));
}

#[test]
fn test_search_keyword() {
    let (_tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["index"]);

    let (stdout, _, success) = run_flowcat(&config_path, &["search", "slack"]);
    assert!(success, "search failed");
    assert!(
        stdout.contains("Slack Notifyonerror Webhook"),
        "Expected the Slack workflow in results, got: {}",
        stdout
    );
    assert!(stdout.contains("total: 1"));
}

#[test]
fn test_search_filters() {
    let (_tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["index"]);

    let (stdout, _, success) =
        run_flowcat(&config_path, &["search", "--trigger", "scheduled", "--json"]);
    assert!(success);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["total"], 1);
    assert_eq!(value["workflows"][0]["display_name"], "Nightly sheet backup");
    assert_eq!(value["workflows"][0]["trigger_type"], "Scheduled");

    let (stdout, _, _) = run_flowcat(&config_path, &["search", "slack", "--active-only"]);
    assert!(stdout.contains("No results"), "got: {}", stdout);

    let (_, stderr, success) = run_flowcat(&config_path, &["search", "--trigger", "hourly"]);
    assert!(!success);
    assert!(stderr.contains("Unknown trigger type"));
}

#[test]
fn test_search_deterministic() {
    let (_tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["index"]);

    let (stdout1, _, _) = run_flowcat(&config_path, &["search", "workflow"]);
    let (stdout2, _, _) = run_flowcat(&config_path, &["search", "workflow"]);
    assert_eq!(
        stdout1, stdout2,
        "Search results should be deterministic across runs"
    );
}

#[test]
fn test_search_empty_catalog() {
    let (_tmp, config_path) = setup_test_env();

    run_flowcat(&config_path, &["init"]);
    let (stdout, _, success) = run_flowcat(&config_path, &["search", ""]);
    assert!(success, "Empty query should not fail");
    assert!(stdout.contains("No results"));
}

#[test]
fn test_category_search() {
    let (_tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["index"]);

    let (stdout, _, success) = run_flowcat(&config_path, &["category", "cloud_storage"]);
    assert!(success);
    assert!(stdout.contains("Nightly sheet backup"), "got: {}", stdout);
    assert!(!stdout.contains("Slack Notifyonerror"));

    let (stdout, _, success) = run_flowcat(&config_path, &["category", "astrology"]);
    assert!(success, "unknown category must not fail");
    assert!(stdout.contains("No results"));
}

#[test]
fn test_categories_without_config() {
    let tmp = TempDir::new().unwrap();
    let (stdout, _, success) = run_flowcat(&tmp.path().join("missing.toml"), &["categories"]);
    assert!(success);
    assert!(stdout.contains("messaging"));
    assert!(stdout.contains("Slack"));
}

#[test]
fn test_get_workflow() {
    let (tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["index"]);

    let filename = "Slack/1234_Slack_NotifyOnError_Webhook.json";
    let (stdout, _, success) = run_flowcat(&config_path, &["get", filename]);
    assert!(success, "get should succeed");
    assert!(stdout.contains("--- Workflow ---"));
    assert!(stdout.contains("trigger:      Webhook"));
    assert!(stdout.contains("source:       fresh"));

    let (stdout, _, success) = run_flowcat(&config_path, &["get", filename, "--raw"]);
    assert!(success);
    assert!(stdout.contains("n8n-nodes-base.slack"));

    fs::write(tmp.path().join("workflows").join(filename), "{}").unwrap();
    let (stdout, _, _) = run_flowcat(&config_path, &["get", filename]);
    assert!(stdout.contains("source:       stale"), "got: {}", stdout);
}

#[test]
fn test_get_rejects_traversal() {
    let (_tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["index"]);

    let (_, stderr, success) = run_flowcat(&config_path, &["get", "../config/flowcat.toml"]);
    assert!(!success);
    assert!(stderr.contains("not found"), "got: {}", stderr);
}

#[test]
fn test_get_missing_workflow() {
    let (_tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["init"]);

    let (_, stderr, success) = run_flowcat(&config_path, &["get", "nonexistent.json"]);
    assert!(!success, "get with missing filename should fail");
    assert!(
        stderr.contains("not found"),
        "Should report not found, got: {}",
        stderr
    );
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["index"]);

    let (stdout, _, success) = run_flowcat(&config_path, &["stats", "--json"]);
    assert!(success);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["total"], 2);
    assert_eq!(value["active"], 1);
    assert_eq!(value["total_nodes"], 5);
    assert_eq!(value["unique_integrations"], 3);

    let (stdout, _, success) = run_flowcat(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Workflows:    2"), "got: {}", stdout);
}

#[test]
fn test_export() {
    let (tmp, config_path) = setup_test_env();
    run_flowcat(&config_path, &["index"]);

    let out = tmp.path().join("site/search-index.json");
    let (_, stderr, success) =
        run_flowcat(&config_path, &["export", "--output", out.to_str().unwrap()]);
    assert!(success, "export failed: {}", stderr);
    assert!(stderr.contains("Exported 2 workflows"));

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["version"], "1.0");
    assert_eq!(value["workflows"].as_array().unwrap().len(), 2);
    assert_eq!(value["workflows"][0]["category"], "cloud_storage");
    assert_eq!(
        value["workflows"][0]["id"],
        "Googlesheets/0002_GoogleSheets_Backup_Scheduled"
    );
    assert!(value["workflows"][0]["record_id"].is_i64());
    assert_eq!(value["workflows"][1]["category"], "messaging");
}
