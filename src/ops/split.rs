//! Split a file into chunk files
//!
//! Estimate → stream the file in `rows_per_chunk` groups → write each group
//! to its assigned chunk path. Optional join/clean through the epilogue.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::engine::{Epilogue, Flow, OperationHandle, StreamChunkEngine};
use crate::error::{ChunkError, Result};
use crate::estimate::{estimate, ChunkEstimate};
use crate::source::DataSource;

#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    /// Absent when the whole file went into a single chunk.
    pub estimate: Option<ChunkEstimate>,
    pub rows: u64,
    pub handle: OperationHandle,
}

/// Splits `input` into chunks of about `chunk_size_mb` megabytes under
/// `chunk_dir`, which must not exist yet. Without a budget the whole file
/// becomes one chunk.
pub fn split<D: DataSource>(
    source: &D,
    input: &Path,
    chunk_dir: &Path,
    chunk_size_mb: Option<f64>,
    epilogue: Epilogue,
) -> Result<SplitReport> {
    let (estimate, rows_per_chunk, expected) = plan(input, chunk_size_mb)?;

    info!(
        input = %input.display(),
        chunk_dir = %chunk_dir.display(),
        rows_per_chunk,
        expected,
        "Splitting"
    );

    let chunks = source.read_as_chunks(input, rows_per_chunk)?;
    let mut rows = 0u64;
    let handle = {
        let mut engine = StreamChunkEngine::new(
            |records: Vec<D::Record>, path: &Path| -> anyhow::Result<Flow> {
                rows += records.len() as u64;
                source.write_chunk(&records, path)?;
                Ok(Flow::Continue)
            },
        )
        .expected_chunks(expected)
        .epilogue(epilogue);
        engine.operate(chunks, chunk_dir)?
    };

    Ok(SplitReport {
        estimate,
        rows,
        handle,
    })
}

/// Chunk sizing for streaming `input`: the estimate, rows per chunk and the
/// chunk count used for name padding. Without a budget the whole file is
/// one chunk.
pub(crate) fn plan(
    input: &Path,
    chunk_size_mb: Option<f64>,
) -> Result<(Option<ChunkEstimate>, usize, u64)> {
    let Some(mb) = chunk_size_mb else {
        return Ok((None, usize::MAX, 1));
    };
    let est = estimate(input, mb)?;
    // An unterminated last line is a record `wc -l` doesn't count
    let records = est.lines + u64::from(has_unterminated_tail(input)?);
    let expected = records.div_ceil(est.rows_per_chunk).max(1);
    let rows_per_chunk = usize::try_from(est.rows_per_chunk).unwrap_or(usize::MAX);
    Ok((Some(est), rows_per_chunk, expected))
}

fn has_unterminated_tail(path: &Path) -> Result<bool> {
    let mut file =
        File::open(path).map_err(|e| ChunkError::io("Failed to open source", path, e))?;
    let len = file
        .metadata()
        .map_err(|e| ChunkError::io("Failed to stat source", path, e))?
        .len();
    if len == 0 {
        return Ok(false);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| ChunkError::io("Failed to read source", path, e))?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Lines;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_split_without_budget_is_one_chunk() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.txt");
        fs::write(&input, b"a\nb\nc\n").unwrap();
        let dir = tmp.path().join("in");

        let report = split(&Lines, &input, &dir, None, Epilogue::new()).unwrap();

        assert!(report.estimate.is_none());
        assert_eq!(report.rows, 3);
        assert_eq!(report.handle.chunk_paths, vec![dir.join("in-1")]);
        assert_eq!(fs::read(dir.join("in-1")).unwrap(), b"a\nb\nc\n");
    }

    #[test]
    fn test_split_pads_for_unterminated_tail() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.txt");
        // 9 newlines + 1 unterminated line, 1 row per chunk -> 10 chunks
        let body: String = (0..9).map(|i| format!("{i}\n")).collect::<String>() + "9";
        fs::write(&input, &body).unwrap();
        let dir = tmp.path().join("t");

        // 19 bytes, 9 lines: 2 bytes per row budget -> 1 row per chunk
        let report = split(&Lines, &input, &dir, Some(2e-6), Epilogue::new()).unwrap();

        assert_eq!(report.handle.chunk_paths.len(), 10);
        assert_eq!(report.handle.chunk_paths[0], dir.join("t-01"));
        assert_eq!(report.handle.chunk_paths[9], dir.join("t-10"));
    }
}
