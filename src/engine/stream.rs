//! Stream-driven chunking
//!
//! Pulls chunks one at a time from a lazy sequence, assigns each a path in a
//! freshly created chunk directory and hands both to the callback, which is
//! expected to persist the chunk there. At most one chunk is in memory.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use super::{Epilogue, Flow, OperationHandle, Strategy};
use crate::error::{ChunkError, Result};
use crate::naming::chunk_path;

/// Per-chunk driver over a lazy chunk sequence.
pub struct StreamChunkEngine<F> {
    on_chunk: F,
    expected_chunks: Option<u64>,
    epilogue: Epilogue,
}

impl<F> StreamChunkEngine<F> {
    pub fn new(on_chunk: F) -> Self {
        Self {
            on_chunk,
            expected_chunks: None,
            epilogue: Epilogue::default(),
        }
    }

    /// Expected number of chunks; enables zero-padded chunk names.
    pub fn expected_chunks(mut self, expected: u64) -> Self {
        self.expected_chunks = Some(expected);
        self
    }

    pub fn epilogue(mut self, epilogue: Epilogue) -> Self {
        self.epilogue = epilogue;
        self
    }

    /// Hands back the callback, and with it any state it accumulated.
    pub fn into_callback(self) -> F {
        self.on_chunk
    }

    /// Runs the callback over `chunks`, writing paths under `chunk_dir`.
    ///
    /// `chunk_dir` must not exist. On [`Flow::Stop`] no further chunk is
    /// pulled from the sequence; the epilogue runs over the paths recorded
    /// so far. Sequence or callback errors abort and leave the directory.
    pub fn operate<T, I>(&mut self, chunks: I, chunk_dir: &Path) -> Result<OperationHandle>
    where
        I: IntoIterator<Item = Result<T>>,
        F: FnMut(T, &Path) -> anyhow::Result<Flow>,
    {
        self.epilogue.validate(chunk_dir)?;
        fs::create_dir(chunk_dir).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => ChunkError::ChunkDirExists(chunk_dir.to_path_buf()),
            _ => ChunkError::io("Failed to create chunk directory", chunk_dir, e),
        })?;

        info!(
            strategy = ?Strategy::Stream,
            chunk_dir = %chunk_dir.display(),
            expected = ?self.expected_chunks,
            "operating"
        );

        let mut handle = OperationHandle::new(Strategy::Stream, chunk_dir);
        let mut index = 0u64;

        for chunk in chunks {
            let chunk = chunk?;
            index += 1;
            let path = chunk_path(chunk_dir, index, self.expected_chunks);
            handle.chunk_paths.push(path.clone());
            handle.invocations += 1;

            debug!(chunk = index, path = %path.display(), "Processing chunk");
            let flow = (self.on_chunk)(chunk, &path).map_err(ChunkError::from_callback)?;
            if flow.is_stop() {
                debug!(chunk = index, "Callback stopped the stream");
                handle.stopped = true;
                break;
            }
        }

        self.epilogue.run(&mut handle)?;
        info!(chunks = handle.chunk_paths.len(), stopped = handle.stopped, "done");
        Ok(handle)
    }
}
