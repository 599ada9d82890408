//! Playlist resolution.
//!
//! Turns an ordered list of recommended (artist, title) pairs into library
//! track ids for one playlist: library lookups first, then one batched
//! round of fetch requests with a single rescan, then a re-check of the
//! fetched subset.

mod dedup;
mod runner;
mod types;

pub use dedup::DedupSet;
pub use runner::PlaylistResolver;
pub use types::{Candidate, ResolveError, RunStats, RunStatsSnapshot};
