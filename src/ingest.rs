//! Indexing pipeline orchestration.
//!
//! Coordinates one indexing run: corpus scan → change detection →
//! analysis → catalog upsert, optionally followed by pruning records whose
//! source file disappeared.
//!
//! Per-document problems (unreadable file, malformed JSON) are logged,
//! counted in [`IndexStats::errors`] and never abort the run. Catalog
//! failures are fatal and propagate to the caller. Each document is
//! committed in its own transaction, so an aborted run leaves every
//! already-handled document fully indexed.

use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::analyze::analyze_document;
use crate::catalog::SqliteCatalog;
use crate::config::{Config, CorpusConfig};
use crate::connector_fs;
use crate::error::AnalyzeError;
use crate::fingerprint::{fingerprint_bytes, is_stale};
use crate::models::{CatalogEntry, IndexStats};
use crate::progress::{IndexProgressEvent, IndexProgressReporter};

/// Emit an `Analyzing` progress event every this many documents.
const PROGRESS_EVERY: u64 = 50;

/// Options for one indexing run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    /// Re-analyze every document regardless of its fingerprint.
    pub force: bool,
    /// Remove records whose source file is no longer in the corpus.
    pub prune: bool,
}

/// Index the configured corpus into the configured catalog.
pub async fn index_all(
    config: &Config,
    options: IndexOptions,
    progress: &dyn IndexProgressReporter,
) -> Result<IndexStats> {
    let catalog = SqliteCatalog::open(&config.db.path).await?;
    let result = index_corpus(&catalog, &config.corpus, options, progress).await;
    catalog.close().await;
    result
}

/// Index `corpus` into an already-open catalog.
pub async fn index_corpus(
    catalog: &SqliteCatalog,
    corpus: &CorpusConfig,
    options: IndexOptions,
    progress: &dyn IndexProgressReporter,
) -> Result<IndexStats> {
    let mut stats = IndexStats::default();

    if !corpus.root.is_dir() {
        warn!(
            "corpus root {} does not exist, nothing to index",
            corpus.root.display()
        );
        return Ok(stats);
    }

    progress.report(IndexProgressEvent::Scanning {
        root: corpus.root.display().to_string(),
    });
    let scan = connector_fs::scan_corpus(corpus)?;
    stats.errors += scan.walk_errors;

    let stored = catalog.fingerprints().await?;
    let total = scan.files.len() as u64;

    for (i, file) in scan.files.iter().enumerate() {
        let n = i as u64 + 1;

        let bytes = match std::fs::read(&file.path) {
            Ok(bytes) => bytes,
            Err(source) => {
                let err = AnalyzeError::Unreadable {
                    path: file.path.clone(),
                    source,
                };
                warn!("skipping {}", err);
                stats.errors += 1;
                continue;
            }
        };

        let fingerprint = fingerprint_bytes(&bytes);
        let previous = stored.get(&file.filename).map(String::as_str);

        if !is_stale(&fingerprint, previous, options.force) {
            debug!("unchanged: {}", file.filename);
            stats.skipped += 1;
        } else {
            match analyze_document(&file.filename, &bytes) {
                Ok(analysis) => {
                    let entry = CatalogEntry {
                        filename: file.filename.clone(),
                        content_fingerprint: fingerprint,
                        file_size: bytes.len() as u64,
                        analysis,
                    };
                    let analyzed_at = chrono::Utc::now().timestamp_millis();
                    catalog.upsert(&entry, analyzed_at).await?;
                    debug!("indexed: {}", file.filename);
                    stats.processed += 1;
                }
                Err(e) => {
                    warn!("skipping {}", e);
                    stats.errors += 1;
                }
            }
        }

        if n % PROGRESS_EVERY == 0 || n == total {
            progress.report(IndexProgressEvent::Analyzing { n, total });
        }
    }

    if options.prune {
        let present: HashSet<&str> = scan.files.iter().map(|f| f.filename.as_str()).collect();
        for filename in catalog.filenames().await? {
            if !present.contains(filename.as_str()) && catalog.delete(&filename).await? {
                debug!("pruned: {}", filename);
                stats.removed += 1;
            }
        }
        progress.report(IndexProgressEvent::Pruning {
            removed: stats.removed,
        });
    }

    info!(
        processed = stats.processed,
        skipped = stats.skipped,
        errors = stats.errors,
        removed = stats.removed,
        "indexing run complete"
    );

    Ok(stats)
}

/// `flowcat index`: run the pipeline and print the report.
pub async fn run_index(
    config: &Config,
    options: IndexOptions,
    progress: &dyn IndexProgressReporter,
) -> Result<()> {
    let stats = index_all(config, options, progress).await?;

    println!("index {}", config.corpus.root.display());
    if options.force {
        println!("  mode: force");
    }
    println!("  processed: {}", stats.processed);
    println!("  skipped: {}", stats.skipped);
    println!("  errors: {}", stats.errors);
    println!("  removed: {}", stats.removed);
    println!("ok");

    Ok(())
}
