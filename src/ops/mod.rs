//! Clients built on the engines

pub mod dedup;
pub mod project;
pub mod sample;
pub mod split;

pub use dedup::{dedup, DedupReport, DedupStats, Deduplicator};
pub use project::{project, project_value, ProjectReport};
pub use sample::sample;
pub use split::{split, SplitReport};
