//! Error taxonomy for chunk operations
//!
//! Early termination is not an error: callbacks return [`crate::Flow::Stop`].
//! Everything here aborts the running operation and leaves whatever chunk
//! files were already written in place.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Library-wide result alias.
pub type Result<T, E = ChunkError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ChunkError {
    // ── Preconditions ─────────────────────────────────────────────────────────
    #[error("chunk directory already exists: {}", .0.display())]
    ChunkDirExists(PathBuf),

    #[error("chunk directory not found: {}", .0.display())]
    ChunkDirMissing(PathBuf),

    #[error("no chunk files found under {}", .0.display())]
    NoChunks(PathBuf),

    #[error(
        "join output {} lies inside chunk directory {} which is cleaned afterwards",
        output.display(),
        chunk_dir.display()
    )]
    OutputInsideChunkDir { output: PathBuf, chunk_dir: PathBuf },

    #[error("refusing to remove protected path: {}", .0.display())]
    ProtectedPath(PathBuf),

    #[error("chunk size must be a positive number of megabytes, got {0}")]
    InvalidChunkSize(f64),

    #[error("cannot estimate chunk size of empty file: {}", .0.display())]
    EmptySource(PathBuf),

    // ── IO ────────────────────────────────────────────────────────────────────
    #[error("{context}: {}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record in {} at line {line}", path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    // ── Callback ──────────────────────────────────────────────────────────────
    #[error(transparent)]
    Callback(anyhow::Error),
}

impl ChunkError {
    pub(crate) fn io(context: &'static str, path: &Path, source: io::Error) -> Self {
        ChunkError::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Converts a callback failure, handing back library errors untouched.
    pub(crate) fn from_callback(err: anyhow::Error) -> Self {
        match err.downcast::<ChunkError>() {
            Ok(chunk_err) => chunk_err,
            Err(other) => ChunkError::Callback(other),
        }
    }

    /// True for errors raised before any chunk was touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ChunkError::ChunkDirExists(_)
                | ChunkError::ChunkDirMissing(_)
                | ChunkError::NoChunks(_)
                | ChunkError::OutputInsideChunkDir { .. }
                | ChunkError::ProtectedPath(_)
                | ChunkError::InvalidChunkSize(_)
                | ChunkError::EmptySource(_)
        )
    }
}
