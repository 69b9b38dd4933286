//! Chunk file naming
//!
//! Format: `<chunk_dir>/<basename>-<index>`, where `<basename>` is the last
//! component of the chunk directory and `<index>` is 1-based. When the
//! expected chunk count is known the index is zero-padded to its digit width,
//! which makes lexicographic order equal creation order.

use std::path::{Path, PathBuf};

/// Number of decimal digits needed to print `n`.
pub fn digit_width(n: u64) -> usize {
    let mut width = 1;
    let mut rest = n / 10;
    while rest > 0 {
        width += 1;
        rest /= 10;
    }
    width
}

/// File name (without directory) of chunk `index` in `chunk_dir`.
pub fn chunk_file_name(chunk_dir: &Path, index: u64, expected: Option<u64>) -> String {
    let base = chunk_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chunk".to_string());
    match expected {
        Some(expected) => format!("{}-{:0width$}", base, index, width = digit_width(expected)),
        None => format!("{}-{}", base, index),
    }
}

/// Full path of chunk `index` in `chunk_dir`.
///
/// Unpadded names (`expected == None`) do not sort numerically past nine
/// chunks; callers that join or otherwise depend on order must pass the
/// expected count.
pub fn chunk_path(chunk_dir: &Path, index: u64, expected: Option<u64>) -> PathBuf {
    chunk_dir.join(chunk_file_name(chunk_dir, index, expected))
}

/// Default chunk directory for `input`: its file stem, relative to the
/// current directory (`data/orders.jsonl` → `orders`).
pub fn default_chunk_dir(input: &Path) -> PathBuf {
    input
        .file_stem()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("chunks"))
}

/// Sorts paths by their raw bytes, the ordering every chunk operation uses.
pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}
