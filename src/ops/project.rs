//! Single-field projection of JSON-lines records
//!
//! Streams a JSON-lines file chunk by chunk, replaces every document with the
//! value stored under one key, and joins the projected chunks into an output
//! file. Object documents are looked up by field name; array documents by
//! position, so `"2"` selects the third element.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::engine::{Epilogue, Flow, OperationHandle, StreamChunkEngine};
use crate::error::Result;
use crate::ops::split::plan;
use crate::source::{DataSource, JsonLines};

#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    /// Values written to the output.
    pub values: u64,
    /// Documents without a value under the key that were left out.
    pub skipped: u64,
    pub handle: OperationHandle,
}

/// Value of `record` under `key`, if present and not null.
pub fn project_value<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    let value = match record {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }?;
    (!value.is_null()).then_some(value)
}

/// Writes the `key` value of every document in `input` to `output`, one
/// JSON value per line.
///
/// Documents with no value under `key` are dropped when `ignore_na` is set
/// and written as `null` otherwise. `chunk_dir` is scratch space and is
/// removed afterwards.
pub fn project(
    input: &Path,
    output: &Path,
    chunk_dir: &Path,
    key: &str,
    ignore_na: bool,
    chunk_size_mb: Option<f64>,
) -> Result<ProjectReport> {
    let (_, rows_per_chunk, expected) = plan(input, chunk_size_mb)?;

    let chunks = JsonLines.read_as_chunks(input, rows_per_chunk)?;
    let mut values = 0u64;
    let mut skipped = 0u64;
    let handle = {
        let mut engine = StreamChunkEngine::new(
            |records: Vec<Value>, path: &Path| -> anyhow::Result<Flow> {
                let mut projected = Vec::with_capacity(records.len());
                for record in &records {
                    match project_value(record, key) {
                        Some(value) => projected.push(value.clone()),
                        None if ignore_na => skipped += 1,
                        None => projected.push(Value::Null),
                    }
                }
                values += projected.len() as u64;
                JsonLines.write_chunk(&projected, path)?;
                Ok(Flow::Continue)
            },
        )
        .expected_chunks(expected)
        .epilogue(Epilogue::new().join_to(output).clean(true));
        engine.operate(chunks, chunk_dir)?
    };

    info!(
        input = %input.display(),
        output = %output.display(),
        key,
        values,
        skipped,
        "Projected"
    );
    Ok(ProjectReport {
        values,
        skipped,
        handle,
    })
}
