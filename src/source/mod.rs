//! Record formats
//!
//! A [`DataSource`] is the capability the engines' callers need from a file
//! format: stream a file as chunks of records, load one chunk file, persist
//! one chunk file, and give each record an identity for deduplication.
//!
//! Two formats are provided:
//! - [`Lines`]: raw newline-terminated records, written back byte for byte;
//! - [`JsonLines`]: one JSON document per line.

mod jsonl;
mod lines;

pub use jsonl::JsonLines;
pub use lines::Lines;

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, Result};

/// Lazy sequence of record chunks. May be dropped after partial consumption.
pub type ChunkIter<R> = Box<dyn Iterator<Item = Result<Vec<R>>>>;

pub trait DataSource {
    type Record;

    /// Streams `path` in chunks of at most `rows_per_chunk` records.
    fn read_as_chunks(&self, path: &Path, rows_per_chunk: usize) -> Result<ChunkIter<Self::Record>>;

    /// Loads a whole chunk file.
    fn read_chunk(&self, path: &Path) -> Result<Vec<Self::Record>>;

    /// Persists `records` to `path`, replacing it. Complete on return.
    fn write_chunk(&self, records: &[Self::Record], path: &Path) -> Result<()>;

    /// Identity used to decide whether two records are duplicates.
    fn record_key<'a>(&self, record: &'a Self::Record) -> Cow<'a, [u8]>;

    /// Whether the record has no missing values.
    fn is_complete(&self, record: &Self::Record) -> bool;
}

/// Record format selector for callers that pick a source at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Lines,
    Jsonl,
}

impl Format {
    /// Guesses the format from a file extension; anything unknown is lines.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") | Some("json") => Format::Jsonl,
            _ => Format::Lines,
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lines" | "text" => Ok(Format::Lines),
            "jsonl" | "json-lines" | "ndjson" => Ok(Format::Jsonl),
            other => Err(format!("unknown format '{other}' (expected lines or jsonl)")),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Lines => f.write_str("lines"),
            Format::Jsonl => f.write_str("jsonl"),
        }
    }
}

/// Reads raw lines (terminator included) in groups of `rows_per_chunk`.
pub(crate) struct LineChunks {
    reader: BufReader<File>,
    path: PathBuf,
    rows_per_chunk: usize,
    done: bool,
}

impl LineChunks {
    /// Buffer size for reading (64 KB).
    const BUFFER_SIZE: usize = 64 * 1024;

    pub(crate) fn open(path: &Path, rows_per_chunk: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| ChunkError::io("Failed to open source", path, e))?;
        Ok(Self {
            reader: BufReader::with_capacity(Self::BUFFER_SIZE, file),
            path: path.to_path_buf(),
            rows_per_chunk: rows_per_chunk.max(1),
            done: false,
        })
    }
}

impl Iterator for LineChunks {
    type Item = Result<Vec<Vec<u8>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut rows = Vec::new();
        while rows.len() < self.rows_per_chunk {
            let mut line = Vec::new();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => {
                    self.done = true;
                    break;
                }
                Ok(_) => rows.push(line),
                Err(e) => {
                    self.done = true;
                    return Some(Err(ChunkError::io("Failed to read source", &self.path, e)));
                }
            }
        }

        if rows.is_empty() {
            None
        } else {
            Some(Ok(rows))
        }
    }
}

/// Strips one trailing `\n` or `\r\n`.
pub(crate) fn trim_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
