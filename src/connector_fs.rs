//! Corpus enumeration: walk the corpus root and collect workflow files.
//!
//! Files are matched against `include_globs` / `exclude_globs` on their
//! corpus-relative path. The relative path, with `/` separators, becomes
//! the record's `filename` key.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::CorpusConfig;

/// A document file discovered under the corpus root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    pub path: PathBuf,
    pub filename: String,
}

/// Result of one corpus walk.
#[derive(Debug, Default)]
pub struct CorpusScan {
    /// Matching files, sorted by `filename`.
    pub files: Vec<CorpusFile>,
    /// Directory entries that could not be read.
    pub walk_errors: u64,
}

pub fn scan_corpus(corpus: &CorpusConfig) -> Result<CorpusScan> {
    let root = &corpus.root;
    if !root.is_dir() {
        bail!("Corpus root is not a directory: {}", root.display());
    }

    let include_set = build_globset(&corpus.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(corpus.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&default_excludes)?;

    let mut scan = CorpusScan::default();

    for entry in WalkDir::new(root).follow_links(corpus.follow_symlinks) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable corpus entry: {}", e);
                scan.walk_errors += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let filename = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclude_set.is_match(&filename) || !include_set.is_match(&filename) {
            debug!("not a corpus document: {}", filename);
            continue;
        }

        scan.files.push(CorpusFile {
            path: path.to_path_buf(),
            filename,
        });
    }

    // Sort for deterministic ordering
    scan.files.sort_by(|a, b| a.filename.cmp(&b.filename));

    Ok(scan)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
