//! Fuzzy track matching.
//!
//! Decides whether a recommended (artist, title) pair already exists in the
//! library. Matching is purely text-based: normalized names, edit-distance
//! similarity, and version-marker compatibility (a remix never matches the
//! original).

mod engine;
mod normalize;

pub use engine::{MatchOutcome, MatcherConfig, TrackMatcher};
pub use normalize::{dedup_key, normalize, strip_featured, version_marker};
