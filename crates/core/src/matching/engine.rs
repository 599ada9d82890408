//! Library match engine.
//!
//! Pools results from several catalog search strategies, scores each pooled
//! track against the wanted (artist, title) pair, and decides between
//! "reuse this track" and "not in the library".

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::subsonic::{Catalog, CatalogError};

use super::normalize::{normalize, version_marker};

/// Configuration for the track matcher.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Minimum combined score to accept a library match.
    pub match_threshold: f64,
    /// Minimum per-field similarity for the near-duplicate guard.
    pub similarity_threshold: f64,
    /// Max songs per search strategy in library search.
    pub library_search_limit: u32,
    /// Max songs for near-duplicate detection.
    pub similar_search_limit: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.75,
            similarity_threshold: 0.85,
            library_search_limit: 30,
            similar_search_limit: 50,
        }
    }
}

/// Outcome of a library match attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A library track matched with sufficient confidence.
    Match { track_id: String },
    /// Nothing in the library is this track (or this variant of it).
    NoMatch,
}

/// Fuzzy matcher over catalog search results.
#[derive(Debug, Clone, Default)]
pub struct TrackMatcher {
    config: MatcherConfig,
}

impl TrackMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Resolve a recommendation against the library.
    ///
    /// Runs three search strategies to maximize recall, pools the results
    /// (deduplicated by id, first-seen order kept), and picks the track
    /// with the strictly highest score. Ties keep the earlier track.
    ///
    /// Catalog failures propagate; they mean "could not check", which is
    /// not the same as "definitely absent".
    pub async fn resolve(
        &self,
        catalog: &dyn Catalog,
        artist: &str,
        title: &str,
    ) -> Result<MatchOutcome, CatalogError> {
        let search_artist = normalize(artist, false);
        let search_title = normalize(title, false);
        let search_version = version_marker(title);

        let queries = [
            format!("\"{artist}\" \"{title}\""),
            format!("\"{title}\""),
            format!("{artist} {title}"),
        ];

        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut pool = Vec::new();
        for query in &queries {
            let songs = catalog
                .search(query, self.config.library_search_limit)
                .await?;
            for song in songs {
                if seen_ids.insert(song.id.clone()) {
                    pool.push(song);
                }
            }
        }

        if pool.is_empty() {
            return Ok(MatchOutcome::NoMatch);
        }

        let mut best: Option<(f64, &crate::subsonic::LibraryTrack)> = None;
        for song in &pool {
            let score = self.score(&search_artist, &search_title, &song.artist, &song.title);
            if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
                best = Some((score, song));
            }
        }

        let Some((best_score, best_song)) = best else {
            return Ok(MatchOutcome::NoMatch);
        };
        crate::metrics::MATCH_SCORE.observe(best_score);

        if best_score < self.config.match_threshold {
            debug!(
                "Best candidate for {} - {} scored {:.2}, below threshold",
                artist, title, best_score
            );
            return Ok(MatchOutcome::NoMatch);
        }

        let best_version = version_marker(&best_song.title);
        if search_version != best_version {
            // A different variant is not the same track; let the caller
            // fetch the wanted one instead of silently substituting.
            info!(
                "Found different version: {} - {} ({:.0}% match), wanted '{}', library has '{}'",
                best_song.artist,
                best_song.title,
                best_score * 100.0,
                search_version.unwrap_or("original"),
                best_version.unwrap_or("original"),
            );
            return Ok(MatchOutcome::NoMatch);
        }

        debug!(
            "Library match: {} - {} ({:.0}% match)",
            best_song.artist,
            best_song.title,
            best_score * 100.0
        );
        Ok(MatchOutcome::Match {
            track_id: best_song.id.clone(),
        })
    }

    /// Near-duplicate guard, consulted only after [`resolve`] came up empty.
    ///
    /// Searches by artist alone (wider net) and accepts the first result
    /// whose artist AND title both clear the stricter similarity threshold,
    /// with agreeing version-marker presence. Prevents fetching a song that
    /// is already present under a slightly different spelling.
    pub async fn find_similar(
        &self,
        catalog: &dyn Catalog,
        artist: &str,
        title: &str,
    ) -> Result<Option<String>, CatalogError> {
        let songs = catalog
            .search(&format!("\"{artist}\""), self.config.similar_search_limit)
            .await?;

        if songs.is_empty() {
            return Ok(None);
        }

        let search_artist = normalize(artist, true);
        let search_title = normalize(title, true);
        let search_has_version = version_marker(title).is_some();

        for song in &songs {
            if version_marker(&song.title).is_some() != search_has_version {
                continue;
            }

            let artist_sim = similarity(&search_artist, &normalize(&song.artist, true));
            let title_sim = similarity(&search_title, &normalize(&song.title, true));

            if artist_sim >= self.config.similarity_threshold
                && title_sim >= self.config.similarity_threshold
            {
                warn!(
                    "Similar song already in library: {} - {} (artist: {:.0}%, title: {:.0}%)",
                    song.artist,
                    song.title,
                    artist_sim * 100.0,
                    title_sim * 100.0
                );
                return Ok(Some(song.id.clone()));
            }
        }

        Ok(None)
    }

    /// Combined match score: equal halves artist and title similarity.
    fn score(
        &self,
        search_artist: &str,
        search_title: &str,
        result_artist: &str,
        result_title: &str,
    ) -> f64 {
        let artist_sim = similarity(search_artist, &normalize(result_artist, false));
        let title_sim = similarity(search_title, &normalize(result_title, false));
        artist_sim * 0.5 + title_sim * 0.5
    }
}

/// Normalized edit-distance similarity in [0, 1]. Identical strings score 1.
fn similarity(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 && b_len == 0 {
        return 1.0;
    }
    let distance = levenshtein_distance(a, b);
    1.0 - distance as f64 / a_len.max(b_len) as f64
}

/// Levenshtein edit distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(a_len + 1) {
        row[0] = i;
    }
    for (j, val) in matrix[0].iter_mut().enumerate().take(b_len + 1) {
        *val = j;
    }

    for (i, a_char) in a_chars.iter().enumerate() {
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if *a_char == *b_char { 0 } else { 1 };
            matrix[i + 1][j + 1] = (matrix[i][j + 1] + 1)
                .min(matrix[i + 1][j] + 1)
                .min(matrix[i][j] + cost);
        }
    }

    matrix[a_len][b_len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockCatalog;
    use crate::subsonic::LibraryTrack;

    fn track(id: &str, artist: &str, title: &str) -> LibraryTrack {
        LibraryTrack {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: None,
            genre: None,
            rating: 0,
        }
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_similarity_bounds() {
        for (a, b) in [
            ("daft punk", "daft punk"),
            ("daft punk", "daft pink"),
            ("one more time", "completely different"),
            ("", "something"),
            ("", ""),
        ] {
            let s = similarity(a, b);
            assert!((0.0..=1.0).contains(&s), "similarity({a:?},{b:?}) = {s}");
        }
        assert_eq!(similarity("daft punk", "daft punk"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_score_weighting() {
        let matcher = TrackMatcher::new();
        // Identical artist, title half-similar: "ab" vs "a" is distance 1
        // over max length 2, so title similarity is exactly 0.5 and the
        // combined score sits exactly on the 0.75 threshold.
        let score = matcher.score("daft punk", "ab", "daft punk", "a");
        assert_eq!(score, 0.75);

        let perfect = matcher.score("daft punk", "around the world", "Daft Punk", "Around the World");
        assert_eq!(perfect, 1.0);
    }

    #[tokio::test]
    async fn test_resolve_empty_pool_is_no_match() {
        let catalog = MockCatalog::new();
        let matcher = TrackMatcher::new();
        let outcome = matcher
            .resolve(&catalog, "Daft Punk", "One More Time")
            .await
            .unwrap();
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_resolve_exact_match() {
        let catalog = MockCatalog::new();
        catalog
            .add_track(track("t1", "Daft Punk", "One More Time"))
            .await;
        let matcher = TrackMatcher::new();
        let outcome = matcher
            .resolve(&catalog, "Daft Punk", "One More Time")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::Match {
                track_id: "t1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_score_exactly_at_threshold_matches() {
        let catalog = MockCatalog::new();
        // Title "ab" vs "a": combined score exactly 0.75.
        catalog.add_track(track("t1", "Daft Punk", "ab")).await;
        let matcher = TrackMatcher::new();
        let outcome = matcher.resolve(&catalog, "Daft Punk", "a").await.unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::Match {
                track_id: "t1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_score_below_threshold_is_no_match() {
        let catalog = MockCatalog::new();
        // Title "abc" vs "a": title similarity 1/3, score ~0.67 < 0.75.
        catalog.add_track(track("t1", "Daft Punk", "abc")).await;
        let matcher = TrackMatcher::new();
        let outcome = matcher.resolve(&catalog, "Daft Punk", "a").await.unwrap();
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_resolve_score_just_below_threshold_is_no_match() {
        let catalog = MockCatalog::new();
        // 99 matching chars + 101 substitutions over length 200: title
        // similarity 0.495, combined score 0.7475, a hair under 0.75.
        let library_title = "a".repeat(200);
        let wanted_title = format!("{}{}", "a".repeat(99), "b".repeat(101));
        catalog
            .add_track(track("t1", "Daft Punk", &library_title))
            .await;
        let matcher = TrackMatcher::new();
        let outcome = matcher
            .resolve(&catalog, "Daft Punk", &wanted_title)
            .await
            .unwrap();
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_resolve_version_mismatch_is_no_match() {
        let catalog = MockCatalog::new();
        catalog
            .add_track(track("t1", "Daft Punk", "One More Time (Remix)"))
            .await;
        let matcher = TrackMatcher::new();
        // Textual score passes (brackets are stripped before comparison)
        // but the library only has the remix.
        let outcome = matcher
            .resolve(&catalog, "Daft Punk", "One More Time")
            .await
            .unwrap();
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_resolve_same_version_matches() {
        let catalog = MockCatalog::new();
        catalog
            .add_track(track("t1", "Daft Punk", "One More Time (Remix)"))
            .await;
        let matcher = TrackMatcher::new();
        let outcome = matcher
            .resolve(&catalog, "Daft Punk", "One More Time (Remix)")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::Match {
                track_id: "t1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_ties_keep_first_seen() {
        let catalog = MockCatalog::new();
        // Identical artist/title pairs under different ids; the first
        // pooled track must win.
        catalog
            .add_track(track("first", "Daft Punk", "One More Time"))
            .await;
        catalog
            .add_track(track("second", "Daft Punk", "One More Time"))
            .await;
        let matcher = TrackMatcher::new();
        let outcome = matcher
            .resolve(&catalog, "Daft Punk", "One More Time")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MatchOutcome::Match {
                track_id: "first".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_propagates_catalog_error() {
        let catalog = MockCatalog::new();
        catalog.set_next_error(CatalogError::Timeout).await;
        let matcher = TrackMatcher::new();
        let result = matcher.resolve(&catalog, "Daft Punk", "One More Time").await;
        assert!(matches!(result, Err(CatalogError::Timeout)));
    }

    #[tokio::test]
    async fn test_find_similar_accepts_close_spelling() {
        let catalog = MockCatalog::new();
        catalog
            .add_track(track("t1", "Daft Punk", "Harder Better Faster Stronger"))
            .await;
        let matcher = TrackMatcher::new();
        let found = matcher
            .find_similar(&catalog, "Daft Punk", "Harder Better Faster Stronge")
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_find_similar_rejects_version_presence_mismatch() {
        let catalog = MockCatalog::new();
        catalog
            .add_track(track("t1", "Daft Punk", "One More Time (Remix)"))
            .await;
        let matcher = TrackMatcher::new();
        let found = matcher
            .find_similar(&catalog, "Daft Punk", "One More Time")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_similar_rejects_different_title() {
        let catalog = MockCatalog::new();
        catalog
            .add_track(track("t1", "Daft Punk", "Veridis Quo"))
            .await;
        let matcher = TrackMatcher::new();
        let found = matcher
            .find_similar(&catalog, "Daft Punk", "Digital Love")
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
