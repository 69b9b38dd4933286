use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{trim_terminator, ChunkIter, DataSource, LineChunks};
use crate::error::{ChunkError, Result};

/// JSON-lines records: one document per non-blank line.
///
/// Chunks are written compact, one document per line, so a JSON-lines chunk
/// is not byte-identical to its source unless the source was compact too.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLines;

impl JsonLines {
    /// Parses raw lines, skipping blank ones. `line` is the number of raw
    /// lines consumed before `rows`.
    fn parse_rows(path: &Path, rows: Vec<Vec<u8>>, line: &mut u64) -> Result<Vec<Value>> {
        let mut records = Vec::with_capacity(rows.len());
        for raw in rows {
            *line += 1;
            let text = trim_terminator(&raw);
            if text.trim_ascii().is_empty() {
                continue;
            }
            let value = serde_json::from_slice(text).map_err(|source| ChunkError::Malformed {
                path: path.to_path_buf(),
                line: *line,
                source,
            })?;
            records.push(value);
        }
        Ok(records)
    }
}

impl DataSource for JsonLines {
    type Record = Value;

    fn read_as_chunks(&self, path: &Path, rows_per_chunk: usize) -> Result<ChunkIter<Value>> {
        let source: PathBuf = path.to_path_buf();
        let mut line = 0u64;
        let chunks = LineChunks::open(path, rows_per_chunk)?
            .map(move |rows| rows.and_then(|rows| Self::parse_rows(&source, rows, &mut line)))
            // Blank-only groups parse to nothing; don't hand out empty chunks
            .filter(|chunk| !matches!(chunk, Ok(records) if records.is_empty()));
        Ok(Box::new(chunks))
    }

    fn read_chunk(&self, path: &Path) -> Result<Vec<Value>> {
        let mut line = 0u64;
        let mut records = Vec::new();
        for rows in LineChunks::open(path, usize::MAX)? {
            records.extend(Self::parse_rows(path, rows?, &mut line)?);
        }
        Ok(records)
    }

    fn write_chunk(&self, records: &[Value], path: &Path) -> Result<()> {
        let file =
            File::create(path).map_err(|e| ChunkError::io("Failed to create chunk", path, e))?;
        let mut writer = BufWriter::new(file);

        for record in records {
            serde_json::to_writer(&mut writer, record)
                .map_err(|e| ChunkError::io("Failed to write chunk", path, e.into()))?;
            writer
                .write_all(b"\n")
                .map_err(|e| ChunkError::io("Failed to write chunk", path, e))?;
        }

        writer
            .flush()
            .map_err(|e| ChunkError::io("Failed to flush chunk", path, e))
    }

    fn record_key<'a>(&self, record: &'a Value) -> Cow<'a, [u8]> {
        // Object keys serialize sorted, so equal documents share a key
        Cow::Owned(serde_json::to_vec(record).unwrap_or_default())
    }

    fn is_complete(&self, record: &Value) -> bool {
        match record {
            Value::Null => false,
            Value::Object(map) => map.values().all(|v| !v.is_null()),
            _ => true,
        }
    }
}
