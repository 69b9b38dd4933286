//! Joining chunk files back into one output
//!
//! Byte-exact concatenation in name order. Streaming: never holds more than
//! the copy buffer in memory.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ChunkError, Result};
use crate::naming::sort_paths;

/// Buffer size for reading/writing (64 KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Concatenates `paths`, sorted by name, into `output`.
///
/// Returns the number of bytes written, or `None` when `paths` is empty, in
/// which case `output` is not created. A failure part-way leaves a partial
/// output file behind.
pub fn join(paths: &[PathBuf], output: &Path) -> Result<Option<u64>> {
    if paths.is_empty() {
        debug!(output = %output.display(), "No chunks to join");
        return Ok(None);
    }

    info!(chunks = paths.len(), output = %output.display(), "joining");

    let mut sorted = paths.to_vec();
    sort_paths(&mut sorted);

    let file = File::create(output)
        .map_err(|e| ChunkError::io("Failed to create join output", output, e))?;
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, file);
    let mut total = 0u64;

    for chunk_path in &sorted {
        let chunk = File::open(chunk_path)
            .map_err(|e| ChunkError::io("Failed to open chunk", chunk_path, e))?;
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, chunk);
        let copied = io::copy(&mut reader, &mut writer)
            .map_err(|e| ChunkError::io("Failed to append chunk", chunk_path, e))?;
        debug!(chunk = %chunk_path.display(), bytes = copied, "Appended chunk");
        total += copied;
    }

    writer
        .flush()
        .map_err(|e| ChunkError::io("Failed to flush join output", output, e))?;

    Ok(Some(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_join_sorts_by_name() {
        let dir = TempDir::new().unwrap();
        let b = dir.path().join("part-2");
        let a = dir.path().join("part-1");
        fs::write(&a, b"first\n").unwrap();
        fs::write(&b, b"second\n").unwrap();

        let out = dir.path().join("joined");
        let written = join(&[b, a], &out).unwrap();

        assert_eq!(written, Some(13));
        assert_eq!(fs::read(&out).unwrap(), b"first\nsecond\n");
    }

    #[test]
    fn test_join_empty_is_noop() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("joined");

        assert_eq!(join(&[], &out).unwrap(), None);
        assert!(!out.exists());
    }

    #[test]
    fn test_join_preserves_raw_bytes() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("c-1");
        let b = dir.path().join("c-2");
        fs::write(&a, [0u8, 159, 146, 150]).unwrap();
        fs::write(&b, b"no trailing newline").unwrap();

        let out = dir.path().join("joined");
        join(&[a, b], &out).unwrap();

        let mut expected = vec![0u8, 159, 146, 150];
        expected.extend_from_slice(b"no trailing newline");
        assert_eq!(fs::read(&out).unwrap(), expected);
    }

    #[test]
    fn test_join_missing_chunk_is_fatal() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("joined");
        let missing = dir.path().join("gone");

        match join(&[missing], &out) {
            Err(ChunkError::Io { context, .. }) => assert_eq!(context, "Failed to open chunk"),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
