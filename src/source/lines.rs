use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{trim_terminator, ChunkIter, DataSource, LineChunks};
use crate::error::{ChunkError, Result};

/// Raw line records. Each record keeps its terminator, so writing the chunks
/// of a file back out in order reproduces it byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lines;

impl DataSource for Lines {
    type Record = Vec<u8>;

    fn read_as_chunks(&self, path: &Path, rows_per_chunk: usize) -> Result<ChunkIter<Vec<u8>>> {
        Ok(Box::new(LineChunks::open(path, rows_per_chunk)?))
    }

    fn read_chunk(&self, path: &Path) -> Result<Vec<Vec<u8>>> {
        let data = fs::read(path).map_err(|e| ChunkError::io("Failed to read chunk", path, e))?;
        Ok(data.split_inclusive(|b| *b == b'\n').map(<[u8]>::to_vec).collect())
    }

    fn write_chunk(&self, records: &[Vec<u8>], path: &Path) -> Result<()> {
        let file =
            File::create(path).map_err(|e| ChunkError::io("Failed to create chunk", path, e))?;
        let mut writer = BufWriter::new(file);
        let last = records.len().saturating_sub(1);

        for (i, record) in records.iter().enumerate() {
            writer
                .write_all(record)
                .map_err(|e| ChunkError::io("Failed to write chunk", path, e))?;
            // Only a file's final line may lack a terminator; never glue rows
            if i < last && !record.ends_with(b"\n") {
                writer
                    .write_all(b"\n")
                    .map_err(|e| ChunkError::io("Failed to write chunk", path, e))?;
            }
        }

        writer
            .flush()
            .map_err(|e| ChunkError::io("Failed to flush chunk", path, e))
    }

    fn record_key<'a>(&self, record: &'a Vec<u8>) -> Cow<'a, [u8]> {
        Cow::Borrowed(trim_terminator(record))
    }

    fn is_complete(&self, record: &Vec<u8>) -> bool {
        !record.trim_ascii().is_empty()
    }
}
