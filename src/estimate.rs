//! Chunk size estimation
//!
//! Converts a memory budget in megabytes into the row count a streaming
//! reader needs, from the file's newline count and byte size:
//!
//! ```text
//! rows_per_chunk = ceil(mb * 1e6 * lines / bytes)
//! chunk_count    = ceil(lines / rows_per_chunk)
//! ```
//!
//! This assumes every row has the average size. Real chunk byte sizes vary
//! with the row-size variance of the file.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChunkError, Result};

/// Slice size for parallel newline counting (4 MB).
const COUNT_SLICE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEstimate {
    pub rows_per_chunk: u64,
    pub chunk_count: u64,
    /// Newline count of the file
    pub lines: u64,
    /// Byte size of the file
    pub bytes: u64,
}

/// Estimate chunking parameters for `path` under a `chunk_size_mb` budget.
pub fn estimate(path: &Path, chunk_size_mb: f64) -> Result<ChunkEstimate> {
    if !chunk_size_mb.is_finite() || chunk_size_mb <= 0.0 {
        return Err(ChunkError::InvalidChunkSize(chunk_size_mb));
    }

    let (lines, bytes) = count_lines_and_bytes(path)?;
    if bytes == 0 {
        return Err(ChunkError::EmptySource(path.to_path_buf()));
    }

    let estimate = estimate_from_counts(lines, bytes, chunk_size_mb);
    debug!(
        path = %path.display(),
        lines,
        bytes,
        rows_per_chunk = estimate.rows_per_chunk,
        chunk_count = estimate.chunk_count,
        "Estimated chunk size"
    );
    Ok(estimate)
}

/// Pure arithmetic part of [`estimate`]. `bytes` must be non-zero.
pub fn estimate_from_counts(lines: u64, bytes: u64, chunk_size_mb: f64) -> ChunkEstimate {
    let rows = (chunk_size_mb * 1e6 * lines as f64 / bytes as f64).ceil();
    // A file without newlines still gets one row per chunk
    let rows_per_chunk = (rows as u64).max(1);
    let chunk_count = lines.div_ceil(rows_per_chunk);
    ChunkEstimate {
        rows_per_chunk,
        chunk_count,
        lines,
        bytes,
    }
}

/// Counts `\n` bytes (as `wc -l` does) and the total size of `path`.
pub fn count_lines_and_bytes(path: &Path) -> Result<(u64, u64)> {
    let file = File::open(path).map_err(|e| ChunkError::io("Failed to open file", path, e))?;
    let bytes = file
        .metadata()
        .map_err(|e| ChunkError::io("Failed to stat file", path, e))?
        .len();
    if bytes == 0 {
        // Mapping a zero-length file fails on some platforms
        return Ok((0, 0));
    }

    // SAFETY: the mapping is read-only and dropped before returning. Concurrent
    // truncation by another process would fault, same as any mmap reader.
    let mmap = unsafe { Mmap::map(&file) }
        .map_err(|e| ChunkError::io("Failed to map file", path, e))?;

    let lines = mmap
        .par_chunks(COUNT_SLICE)
        .map(|slice| memchr::memchr_iter(b'\n', slice).count() as u64)
        .sum();

    Ok((lines, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_estimate_sanity() {
        let e = estimate_from_counts(10_000, 1_000_000, 1.0);
        assert_eq!(e.rows_per_chunk, 10_000);
        assert_eq!(e.chunk_count, 1);
    }

    #[test]
    fn test_estimate_multiple_chunks() {
        // 100 bytes per row, 0.001 MB = 1000 bytes = 10 rows
        let e = estimate_from_counts(95, 9_500, 0.001);
        assert_eq!(e.rows_per_chunk, 10);
        assert_eq!(e.chunk_count, 10);
    }

    #[test]
    fn test_estimate_rounds_up() {
        let e = estimate_from_counts(3, 1_000_000, 0.5);
        // 0.5e6 * 3 / 1e6 = 1.5 -> 2
        assert_eq!(e.rows_per_chunk, 2);
        assert_eq!(e.chunk_count, 2);
    }

    #[test]
    fn test_no_newlines_clamps_rows() {
        let e = estimate_from_counts(0, 42, 1.0);
        assert_eq!(e.rows_per_chunk, 1);
        assert_eq!(e.chunk_count, 0);
    }

    #[test]
    fn test_counts_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.txt");
        fs::write(&path, b"a\nbb\nccc\nlast").unwrap();

        // 9 terminated bytes plus an unterminated "last"
        assert_eq!(count_lines_and_bytes(&path).unwrap(), (3, 13));
        let e = estimate(&path, 1.0).unwrap();
        assert_eq!(e.lines, 3);
        assert_eq!(e.bytes, 13);
    }

    #[test]
    fn test_rejects_bad_budget_and_empty_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.txt");
        fs::write(&path, b"").unwrap();

        assert!(matches!(
            estimate(&path, 0.0),
            Err(ChunkError::InvalidChunkSize(_))
        ));
        assert!(matches!(
            estimate(&path, f64::NAN),
            Err(ChunkError::InvalidChunkSize(_))
        ));
        assert!(matches!(
            estimate(&path, 1.0),
            Err(ChunkError::EmptySource(_))
        ));
    }
}
