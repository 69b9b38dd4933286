//! Chunk directory cleanup
//!
//! Removes a chunk directory recursively, refusing paths whose removal would
//! take out more than chunk artifacts: the filesystem root, the current
//! working directory or any ancestor of it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{ChunkError, Result};

/// Check if removing `path` would delete the root or the working directory.
pub fn is_protected_path(path: &Path) -> bool {
    let resolved = match path.canonicalize() {
        Ok(p) => p,
        // Nothing there to protect
        Err(_) => return false,
    };

    if resolved.parent().is_none() {
        return true;
    }

    std::env::current_dir()
        .and_then(|cwd| cwd.canonicalize())
        .map(|cwd| cwd.starts_with(&resolved))
        .unwrap_or(false)
}

/// Validate that `path` may be removed by `operation`.
pub fn validate_removal(operation: &str, path: &Path) -> Result<()> {
    if is_protected_path(path) {
        warn!(operation, path = %path.display(), "Blocked removal of protected path");
        return Err(ChunkError::ProtectedPath(path.to_path_buf()));
    }
    Ok(())
}

/// Check that a joined output will survive cleaning `chunk_dir`.
pub fn validate_output_outside(chunk_dir: &Path, output: &Path) -> Result<()> {
    let dir = absolute(chunk_dir);
    let out = absolute(output);
    if out.starts_with(&dir) {
        return Err(ChunkError::OutputInsideChunkDir {
            output: output.to_path_buf(),
            chunk_dir: chunk_dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Removes `chunk_dir` and everything below it.
///
/// Returns `false` if the directory was already gone.
pub fn clean(chunk_dir: &Path) -> Result<bool> {
    if !chunk_dir.exists() {
        return Ok(false);
    }
    validate_removal("clean", chunk_dir)?;

    info!(chunk_dir = %chunk_dir.display(), "cleaning");
    fs::remove_dir_all(chunk_dir)
        .map_err(|e| ChunkError::io("Failed to remove chunk directory", chunk_dir, e))?;
    Ok(true)
}

fn absolute(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    // Output may not exist yet: resolve its parent instead
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            absolute(parent).join(name)
        }
        _ => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}
