//! Directory-driven chunking
//!
//! Rediscovers chunks previously written to a directory (at any nesting
//! depth) and hands each path, in path-byte order, to the callback.

use std::path::Path;

use tracing::{debug, info};

use super::{open_directory, Epilogue, Flow, OperationHandle, Strategy};
use crate::error::{ChunkError, Result};

pub struct DirectoryChunkEngine<F> {
    on_path: F,
    epilogue: Epilogue,
    require_chunks: bool,
}

impl<F> DirectoryChunkEngine<F>
where
    F: FnMut(&Path) -> anyhow::Result<Flow>,
{
    pub fn new(on_path: F) -> Self {
        Self {
            on_path,
            epilogue: Epilogue::default(),
            require_chunks: false,
        }
    }

    pub fn epilogue(mut self, epilogue: Epilogue) -> Self {
        self.epilogue = epilogue;
        self
    }

    /// Fail with [`ChunkError::NoChunks`] when the directory holds no files.
    pub fn require_chunks(mut self, require: bool) -> Self {
        self.require_chunks = require;
        self
    }

    pub fn into_callback(self) -> F {
        self.on_path
    }

    /// Runs the callback over every file below `chunk_dir`.
    ///
    /// The epilogue joins the full discovered list, also after
    /// [`Flow::Stop`].
    pub fn operate(&mut self, chunk_dir: &Path) -> Result<OperationHandle> {
        let mut handle = open_directory(
            Strategy::Directory,
            chunk_dir,
            &self.epilogue,
            self.require_chunks,
        )?;

        for path in &handle.chunk_paths {
            handle.invocations += 1;
            debug!(path = %path.display(), "Processing chunk");
            let flow = (self.on_path)(path).map_err(ChunkError::from_callback)?;
            if flow.is_stop() {
                debug!(path = %path.display(), "Callback stopped the walk");
                handle.stopped = true;
                break;
            }
        }

        self.epilogue.run(&mut handle)?;
        info!(chunks = handle.chunk_paths.len(), stopped = handle.stopped, "done");
        Ok(handle)
    }
}
