//! Run-scoped duplicate suppression.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::matching::dedup_key;

/// The set of (artist, title) pairs already processed in this run.
///
/// Constructed fresh per run and shared by handle across every playlist
/// resolved in that run, so the same recommendation arriving in two
/// playlists is only acted on once. Membership test and insertion are one
/// atomic step.
#[derive(Debug, Clone, Default)]
pub struct DedupSet {
    inner: Arc<Mutex<HashSet<(String, String)>>>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pair; returns false if it was already seen this run.
    pub fn insert(&self, artist: &str, title: &str) -> bool {
        let key = dedup_key(artist, title);
        self.inner.lock().unwrap().insert(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_insert_accepted_second_rejected() {
        let seen = DedupSet::new();
        assert!(seen.insert("Daft Punk", "One More Time"));
        assert!(!seen.insert("Daft Punk", "One More Time"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_case_and_whitespace_variants_collide() {
        let seen = DedupSet::new();
        assert!(seen.insert("Daft Punk", "One More Time"));
        assert!(!seen.insert("  daft punk ", "ONE MORE TIME"));
        assert!(!seen.insert("DAFT PUNK", " one more time  "));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let seen = DedupSet::new();
        let other = seen.clone();
        assert!(seen.insert("Daft Punk", "Aerodynamic"));
        assert!(!other.insert("Daft Punk", "Aerodynamic"));
    }
}
