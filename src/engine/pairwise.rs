//! Pairwise chunk iteration
//!
//! For every chunk in the sorted set (`self_path`), iterate the whole set
//! again (`parallel_path`) and hand the pair to the callback.
//!
//! - [`Topology::All`] visits every ordered pair, self-pairs included: n².
//! - [`Topology::Unique`] admits a pair only when `parallel_path >= self_path`
//!   in path-byte order: each unordered pair once as `(lower, higher)` plus
//!   every self-pair, n(n+1)/2 in total. For a given `self_path` the
//!   self-pair is always the first admitted pair.
//!
//! "Parallel" names the topology; the loops run sequentially. A chunk shows
//! up as `parallel_path` under many outer iterations, so any concurrent
//! variant would have to serialize read-modify-write per path.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{open_directory, Epilogue, Flow, OperationHandle, Strategy};
use crate::error::{ChunkError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    All,
    Unique,
}

impl Topology {
    /// Whether the pair `(self_path, parallel_path)` is visited.
    pub fn admits(self, self_path: &Path, parallel_path: &Path) -> bool {
        match self {
            Topology::All => true,
            Topology::Unique => parallel_path.as_os_str() >= self_path.as_os_str(),
        }
    }

    pub fn strategy(self) -> Strategy {
        match self {
            Topology::All => Strategy::PairwiseAll,
            Topology::Unique => Strategy::PairwiseUnique,
        }
    }

    /// Number of callback invocations over `n` chunks.
    pub fn pair_count(self, n: u64) -> u64 {
        match self {
            Topology::All => n * n,
            Topology::Unique => n * (n + 1) / 2,
        }
    }
}

pub struct PairwiseEngine<F> {
    on_pair: F,
    topology: Topology,
    epilogue: Epilogue,
    require_chunks: bool,
}

impl<F> PairwiseEngine<F>
where
    F: FnMut(&Path, &Path) -> anyhow::Result<Flow>,
{
    pub fn new(topology: Topology, on_pair: F) -> Self {
        Self {
            on_pair,
            topology,
            epilogue: Epilogue::default(),
            require_chunks: false,
        }
    }

    /// Every ordered pair, self-pairs included.
    pub fn all(on_pair: F) -> Self {
        Self::new(Topology::All, on_pair)
    }

    /// Each unordered pair once, plus every self-pair.
    pub fn unique(on_pair: F) -> Self {
        Self::new(Topology::Unique, on_pair)
    }

    pub fn epilogue(mut self, epilogue: Epilogue) -> Self {
        self.epilogue = epilogue;
        self
    }

    pub fn require_chunks(mut self, require: bool) -> Self {
        self.require_chunks = require;
        self
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn into_callback(self) -> F {
        self.on_pair
    }

    /// Runs the pair callback over the chunks below `chunk_dir`.
    ///
    /// [`Flow::Stop`] ends both the inner and the outer loop; the epilogue
    /// still runs over the discovered set.
    pub fn operate(&mut self, chunk_dir: &Path) -> Result<OperationHandle> {
        let mut handle = open_directory(
            self.topology.strategy(),
            chunk_dir,
            &self.epilogue,
            self.require_chunks,
        )?;
        debug!(
            pairs = self.topology.pair_count(handle.chunk_paths.len() as u64),
            "Planned pair visits"
        );

        'outer: for self_path in &handle.chunk_paths {
            for parallel_path in &handle.chunk_paths {
                if !self.topology.admits(self_path, parallel_path) {
                    continue;
                }
                handle.invocations += 1;
                debug!(
                    self_path = %self_path.display(),
                    parallel_path = %parallel_path.display(),
                    "Processing pair"
                );
                let flow = (self.on_pair)(self_path, parallel_path)
                    .map_err(ChunkError::from_callback)?;
                if flow.is_stop() {
                    handle.stopped = true;
                    break 'outer;
                }
            }
        }

        self.epilogue.run(&mut handle)?;
        info!(
            chunks = handle.chunk_paths.len(),
            pairs = handle.invocations,
            stopped = handle.stopped,
            "done"
        );
        Ok(handle)
    }
}
