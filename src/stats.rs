//! Catalog statistics overview.
//!
//! Summarizes what's indexed: record counts by status, trigger type and
//! complexity, graph sizes, and the most used integrations. Used by
//! `flowcat stats` to confirm that indexing runs are working as expected.

use anyhow::Result;

use crate::catalog::SqliteCatalog;
use crate::config::Config;
use crate::models::{Complexity, TriggerType};

/// Integrations listed by `flowcat stats`.
const TOP_INTEGRATIONS: usize = 10;

/// Run the stats command: query the catalog and print a summary.
pub async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let catalog = SqliteCatalog::open(&config.db.path).await?;
    let stats = catalog.stats(TOP_INTEGRATIONS).await;
    catalog.close().await;
    let stats = stats?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Workflow Catalog — Stats");
    println!("========================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!("  Corpus:       {}", config.corpus.root.display());
    println!(
        "  Last indexed: {}",
        stats
            .last_analyzed_at
            .map(format_ms_relative)
            .unwrap_or_else(|| "never".to_string())
    );
    println!();
    println!("  Workflows:    {}", stats.total);
    println!("  Active:       {}", stats.active);
    println!("  Inactive:     {}", stats.inactive);
    println!("  Nodes:        {}", stats.total_nodes);
    println!("  Connections:  {}", stats.total_connections);
    println!("  Integrations: {}", stats.unique_integrations);

    println!();
    println!("  By trigger:");
    for trigger in TriggerType::ALL {
        let n = stats.triggers.get(trigger.as_str()).copied().unwrap_or(0);
        println!("    {:<12} {:>6}", trigger.as_str(), n);
    }

    println!();
    println!("  By complexity:");
    for complexity in Complexity::ALL {
        let n = stats
            .complexity
            .get(complexity.as_str())
            .copied()
            .unwrap_or(0);
        println!("    {:<12} {:>6}", complexity.as_str(), n);
    }

    if !stats.top_integrations.is_empty() {
        println!();
        println!("  {:<28} {:>6}", "INTEGRATION", "USED");
        println!("  {}", "-".repeat(35));
        for entry in &stats.top_integrations {
            println!("  {:<28} {:>6}", entry.name, entry.count);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format Unix milliseconds as a relative time string (e.g. "3 hours ago").
fn format_ms_relative(ms: i64) -> String {
    let delta = (chrono::Utc::now().timestamp_millis() - ms) / 1000;

    if delta < 0 {
        return format_ms_iso(ms);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ms_iso(ms)
    }
}

fn format_ms_iso(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}
