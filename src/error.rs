//! Error taxonomy for the indexing and query core.
//!
//! Two kinds of failure exist and they propagate differently:
//!
//! - [`AnalyzeError`] is scoped to one source document. The indexing
//!   pipeline counts it and moves on to the next file.
//! - [`CatalogError`] means the catalog store itself cannot be opened or
//!   written. It aborts the current indexing run or query.
//!
//! Unknown category keys are not errors; they yield an empty page.

use std::path::PathBuf;
use thiserror::Error;

/// A source document could not be turned into a catalog record.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed document {filename}: {reason}")]
    Malformed { filename: String, reason: String },
}

impl AnalyzeError {
    pub fn malformed(filename: &str, reason: impl Into<String>) -> Self {
        AnalyzeError::Malformed {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }
}

/// The catalog store is unavailable (cannot open, read or write).
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("catalog I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt catalog row for {filename}: {reason}")]
    CorruptRow { filename: String, reason: String },
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
