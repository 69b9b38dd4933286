//! Global deduplication across a chunk directory
//!
//! Runs over every unique pair of chunks. The self-pair removes repeats
//! inside a chunk; a cross pair `(lower, higher)` removes from `higher` the
//! rows already present in `lower`. Since each chunk is its own first
//! admitted pair, it is deduplicated in place before it is compared with any
//! later chunk, and every later chunk has already been compared with all
//! earlier ones by the time its own self-pair comes round. The earliest chunk
//! in path order, and within a chunk the first row, keeps a repeated value.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::engine::{Epilogue, Flow, OperationHandle, PairwiseEngine};
use crate::error::Result;
use crate::row_diff::drop_duplicates;
use crate::source::DataSource;

/// Counters from one deduplication run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    /// Rows removed because they repeat earlier in the same chunk.
    pub within_removed: u64,
    /// Rows removed because an earlier chunk already holds them.
    pub across_removed: u64,
    /// Rows left across all chunks.
    pub rows_kept: u64,
    pub pairs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupReport {
    pub stats: DedupStats,
    pub handle: OperationHandle,
}

/// Pair callback state: the rows of the current `self_path` chunk, already
/// free of repeats once its self-pair has run.
pub struct Deduplicator<'s, D: DataSource> {
    source: &'s D,
    current: Option<(PathBuf, Vec<D::Record>)>,
    stats: DedupStats,
}

impl<'s, D: DataSource> Deduplicator<'s, D> {
    pub fn new(source: &'s D) -> Self {
        Self {
            source,
            current: None,
            stats: DedupStats::default(),
        }
    }

    pub fn stats(&self) -> &DedupStats {
        &self.stats
    }

    pub fn into_stats(self) -> DedupStats {
        self.stats
    }

    /// Pair callback for [`PairwiseEngine`] in unique topology.
    pub fn on_pair(&mut self, self_path: &Path, parallel_path: &Path) -> anyhow::Result<Flow> {
        self.stats.pairs += 1;
        if self_path == parallel_path {
            self.dedup_within(self_path)?;
        } else {
            self.dedup_across(self_path, parallel_path)?;
        }
        Ok(Flow::Continue)
    }

    fn dedup_within(&mut self, path: &Path) -> Result<()> {
        let source = self.source;
        let rows = source.read_chunk(path)?;
        let before = rows.len();
        let (_, kept) = drop_duplicates(Vec::new(), rows, |r| source.record_key(r));
        let removed = before - kept.len();
        if removed > 0 {
            debug!(path = %path.display(), removed, "Removed repeats within chunk");
            source.write_chunk(&kept, path)?;
        }
        self.stats.within_removed += removed as u64;
        self.stats.rows_kept += kept.len() as u64;
        self.current = Some((path.to_path_buf(), kept));
        Ok(())
    }

    fn dedup_across(&mut self, self_path: &Path, parallel_path: &Path) -> Result<()> {
        let source = self.source;
        let (path, rows) = match self.current.take() {
            Some((path, rows)) if path == self_path => (path, rows),
            // Only reached when driven outside unique order
            _ => (self_path.to_path_buf(), source.read_chunk(self_path)?),
        };

        let parallel = source.read_chunk(parallel_path)?;
        let before = parallel.len();
        // `rows` has no repeats of its own, so only `parallel` can shrink
        let (rows, kept) = drop_duplicates(rows, parallel, |r| source.record_key(r));
        let removed = before - kept.len();
        self.current = Some((path, rows));
        if removed > 0 {
            debug!(
                self_path = %self_path.display(),
                parallel_path = %parallel_path.display(),
                removed,
                "Removed rows held by earlier chunk"
            );
            source.write_chunk(&kept, parallel_path)?;
        }
        self.stats.across_removed += removed as u64;
        Ok(())
    }
}

/// Deduplicates every row of the chunks below `chunk_dir` in place.
pub fn dedup<D: DataSource>(
    source: &D,
    chunk_dir: &Path,
    epilogue: Epilogue,
) -> Result<DedupReport> {
    let mut deduplicator = Deduplicator::new(source);
    let handle = {
        let mut engine = PairwiseEngine::unique(|a: &Path, b: &Path| deduplicator.on_pair(a, b))
            .require_chunks(true)
            .epilogue(epilogue);
        engine.operate(chunk_dir)?
    };
    let stats = deduplicator.into_stats();

    info!(
        chunks = handle.chunk_paths.len(),
        within = stats.within_removed,
        across = stats.across_removed,
        kept = stats.rows_kept,
        "Deduplicated"
    );
    Ok(DedupReport { stats, handle })
}
