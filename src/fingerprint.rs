//! Change detection by content fingerprint.
//!
//! A fingerprint is the SHA-256 of a file's full byte stream, hex-encoded.
//! Modification times are never consulted, so touching a file without
//! changing its bytes does not trigger re-analysis.

use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Stream a file through the hasher without loading it whole.
pub fn fingerprint_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Whether a document whose bytes hash to `current` must be re-analyzed.
pub fn is_stale(current: &str, stored: Option<&str>, force: bool) -> bool {
    force || stored != Some(current)
}

/// Hash `path` and compare against the fingerprint recorded in the catalog.
pub fn needs_reanalysis(path: &Path, stored: Option<&str>, force: bool) -> std::io::Result<bool> {
    if force || stored.is_none() {
        return Ok(true);
    }
    let current = fingerprint_file(path)?;
    Ok(is_stale(&current, stored, false))
}
