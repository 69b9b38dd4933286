//! Chunk orchestration engines
//!
//! Three loop shapes share one epilogue (join, then clean):
//!
//! 1. **Stream**: a lazy sequence of in-memory chunks is numbered, given a
//!    path under a fresh chunk directory and handed to a callback.
//! 2. **Directory**: an existing chunk directory is walked recursively, its
//!    files sorted by path bytes and handed to a callback one by one.
//! 3. **Pairwise**: the directory walk, but the callback receives pairs of
//!    chunk paths, either every ordered pair or each unordered pair once.
//!
//! Callbacks steer the loop with [`Flow`]. Returning [`Flow::Stop`] ends the
//! loop early and the epilogue still runs over the chunks seen so far.
//! Returning an error aborts the whole operation without any rollback.

pub mod directory;
pub mod pairwise;
pub mod stream;

pub use directory::DirectoryChunkEngine;
pub use pairwise::{PairwiseEngine, Topology};
pub use stream::StreamChunkEngine;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::clean::{clean, validate_output_outside};
use crate::error::{ChunkError, Result};
use crate::join::join;
use crate::naming::sort_paths;

/// What a callback wants the engine loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Flow {
    pub fn is_stop(self) -> bool {
        self == Flow::Stop
    }
}

/// Loop shape that produced an [`OperationHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Stream,
    Directory,
    PairwiseAll,
    PairwiseUnique,
}

/// Post-loop steps: optional join into one file, optional removal of the
/// chunk directory. Clean runs even when no join was requested.
#[derive(Debug, Clone, Default)]
pub struct Epilogue {
    pub join_path: Option<PathBuf>,
    pub clean: bool,
}

impl Epilogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the joined output path.
    pub fn join_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.join_path = Some(path.into());
        self
    }

    /// Sets whether the chunk directory is removed afterwards.
    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Rejects a join target that cleaning would delete.
    pub(crate) fn validate(&self, chunk_dir: &Path) -> Result<()> {
        match (&self.join_path, self.clean) {
            (Some(output), true) => validate_output_outside(chunk_dir, output),
            _ => Ok(()),
        }
    }

    pub(crate) fn run(&self, handle: &mut OperationHandle) -> Result<()> {
        if let Some(output) = &self.join_path {
            if join(&handle.chunk_paths, output)?.is_some() {
                handle.joined = Some(output.clone());
            }
        }
        if self.clean {
            handle.cleaned = clean(&handle.chunk_dir)?;
        }
        Ok(())
    }
}

/// Outcome of one `operate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationHandle {
    pub strategy: Strategy,
    pub chunk_dir: PathBuf,
    /// Created (stream) or discovered (directory, pairwise) chunk paths,
    /// sorted by path bytes for directory-driven strategies.
    pub chunk_paths: Vec<PathBuf>,
    /// Number of callback invocations, including the one that stopped.
    pub invocations: u64,
    /// True if a callback returned [`Flow::Stop`].
    pub stopped: bool,
    /// Join output, if one was written.
    pub joined: Option<PathBuf>,
    /// True if the chunk directory was removed.
    pub cleaned: bool,
}

impl OperationHandle {
    pub(crate) fn new(strategy: Strategy, chunk_dir: &Path) -> Self {
        Self {
            strategy,
            chunk_dir: chunk_dir.to_path_buf(),
            chunk_paths: Vec::new(),
            invocations: 0,
            stopped: false,
            joined: None,
            cleaned: false,
        }
    }
}

/// Walks `chunk_dir` recursively and returns every regular file, sorted by
/// path bytes.
///
/// The sort is what makes joins and pairwise tie-breaks follow chunk order;
/// walk order itself is filesystem dependent.
pub fn discover(chunk_dir: &Path) -> Result<Vec<PathBuf>> {
    if !chunk_dir.is_dir() {
        return Err(ChunkError::ChunkDirMissing(chunk_dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(chunk_dir) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(chunk_dir).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            ChunkError::Io {
                context: "Failed to walk chunk directory",
                path,
                source,
            }
        })?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }
    sort_paths(&mut paths);

    debug!(chunk_dir = %chunk_dir.display(), chunks = paths.len(), "Discovered chunks");
    Ok(paths)
}

/// Shared loop prologue for directory-driven strategies.
pub(crate) fn open_directory(
    strategy: Strategy,
    chunk_dir: &Path,
    epilogue: &Epilogue,
    require_chunks: bool,
) -> Result<OperationHandle> {
    epilogue.validate(chunk_dir)?;
    let chunk_paths = discover(chunk_dir)?;
    if require_chunks && chunk_paths.is_empty() {
        return Err(ChunkError::NoChunks(chunk_dir.to_path_buf()));
    }

    info!(?strategy, chunk_dir = %chunk_dir.display(), chunks = chunk_paths.len(), "operating");
    let mut handle = OperationHandle::new(strategy, chunk_dir);
    handle.chunk_paths = chunk_paths;
    Ok(handle)
}
