//! Early-stopping sampler
//!
//! Streams a file chunk by chunk and keeps the complete rows of each. The
//! first chunk with at least `min_rows` complete rows provides the sample
//! and stops the stream; nothing after it is read. The scratch chunk
//! directory is removed afterwards either way.

use std::path::Path;

use tracing::info;

use crate::engine::{Epilogue, Flow, StreamChunkEngine};
use crate::error::Result;
use crate::ops::split::plan;
use crate::source::DataSource;

/// Takes up to `max_rows` complete rows from the first chunk that has at
/// least `min_rows` of them. `None` if no chunk qualifies. With
/// `min_rows == 0` the first chunk always qualifies, even with no complete
/// rows.
///
/// Chunks are sized by `chunk_size_mb`, or hold the whole file without a
/// budget.
pub fn sample<D: DataSource>(
    source: &D,
    input: &Path,
    chunk_dir: &Path,
    chunk_size_mb: Option<f64>,
    min_rows: usize,
    max_rows: usize,
) -> Result<Option<Vec<D::Record>>> {
    let (_, rows_per_chunk, _) = plan(input, chunk_size_mb)?;

    let chunks = source.read_as_chunks(input, rows_per_chunk)?;
    let mut sampled = None;
    let handle = {
        let mut engine = StreamChunkEngine::new(
            |records: Vec<D::Record>, _path: &Path| -> anyhow::Result<Flow> {
                let complete: Vec<D::Record> = records
                    .into_iter()
                    .filter(|r| source.is_complete(r))
                    .collect();
                if complete.len() < min_rows {
                    return Ok(Flow::Continue);
                }
                sampled = Some(complete.into_iter().take(max_rows).collect::<Vec<_>>());
                Ok(Flow::Stop)
            },
        )
        .epilogue(Epilogue::new().clean(true));
        engine.operate(chunks, chunk_dir)?
    };

    info!(
        input = %input.display(),
        chunks_read = handle.invocations,
        sampled = sampled.as_ref().map(Vec::len),
        "Sampled"
    );
    Ok(sampled)
}
