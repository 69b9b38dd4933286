//! datamgr - Chunked processing of large record files
//!
//! Files too large to handle in one piece are split into numbered chunk
//! files, processed one chunk (or one pair of chunks) at a time, and joined
//! back together. The engines in [`engine`] own the loop: numbering, path
//! assignment, discovery order, early termination, join and cleanup. Callers
//! supply a callback per chunk or per pair.

/// Chunk loops and their shared epilogue
pub mod engine;
/// Library error type
pub mod error;

/// Chunk directory removal with path protection
pub mod clean;
/// Size budget to row count conversion
pub mod estimate;
/// Concatenation of chunk files
pub mod join;
/// Chunk file names and ordering
pub mod naming;

/// Record formats
pub mod source;
/// Duplicate detection between record sets
pub mod row_diff;

/// Split, dedup, sample and project clients
pub mod ops;

pub use engine::{
    discover, DirectoryChunkEngine, Epilogue, Flow, OperationHandle, PairwiseEngine,
    StreamChunkEngine, Strategy, Topology,
};
pub use error::{ChunkError, Result};
pub use estimate::ChunkEstimate;
pub use source::{DataSource, Format, JsonLines, Lines};
