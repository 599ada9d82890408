//! Mock catalog for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::subsonic::{AlbumRef, Catalog, CatalogError, LibraryTrack, PlaylistRef};

/// Mock implementation of the `Catalog` trait.
///
/// Provides controllable behavior for testing:
/// - An in-memory library served through a naive text search
/// - A pending-delivery queue that `start_scan` flushes into the library,
///   modeling tracks that only become searchable after a rescan
/// - Recorded searches, scans and playlist writes for assertions
/// - Injectable one-shot errors
pub struct MockCatalog {
    library: Arc<RwLock<Vec<LibraryTrack>>>,
    albums: Arc<RwLock<Vec<(String, Vec<LibraryTrack>)>>>,
    pending_delivery: Arc<RwLock<Vec<LibraryTrack>>>,
    searches: Arc<RwLock<Vec<String>>>,
    scans_triggered: Arc<RwLock<u32>>,
    scan_waits: Arc<RwLock<u32>>,
    album_track_fetches: Arc<RwLock<u32>>,
    created_playlists: Arc<RwLock<Vec<(String, Vec<String>)>>>,
    queued_errors: Arc<RwLock<VecDeque<CatalogError>>>,
    scan_confirms: Arc<RwLock<bool>>,
    match_all_tokens: Arc<RwLock<bool>>,
    rating_lookups_fail: Arc<RwLock<bool>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Create a new mock catalog with an empty library.
    pub fn new() -> Self {
        Self {
            library: Arc::new(RwLock::new(Vec::new())),
            albums: Arc::new(RwLock::new(Vec::new())),
            pending_delivery: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            scans_triggered: Arc::new(RwLock::new(0)),
            scan_waits: Arc::new(RwLock::new(0)),
            album_track_fetches: Arc::new(RwLock::new(0)),
            created_playlists: Arc::new(RwLock::new(Vec::new())),
            queued_errors: Arc::new(RwLock::new(VecDeque::new())),
            scan_confirms: Arc::new(RwLock::new(true)),
            match_all_tokens: Arc::new(RwLock::new(false)),
            rating_lookups_fail: Arc::new(RwLock::new(false)),
        }
    }

    /// Add a track to the searchable library.
    pub async fn add_track(&self, track: LibraryTrack) {
        self.library.write().await.push(track);
    }

    /// Add an album (visible to `album_page` / `album_tracks`).
    pub async fn add_album(&self, id: &str, tracks: Vec<LibraryTrack>) {
        self.albums.write().await.push((id.to_string(), tracks));
    }

    /// Queue a track that only appears in the library after the next scan.
    pub async fn deliver_on_scan(&self, track: LibraryTrack) {
        self.pending_delivery.write().await.push(track);
    }

    /// Change the rating of a library track in place.
    pub async fn set_rating(&self, track_id: &str, rating: u32) {
        let mut library = self.library.write().await;
        if let Some(track) = library.iter_mut().find(|t| t.id == track_id) {
            track.rating = rating;
        }
    }

    /// Queue an error; each fallible call consumes one queued error first.
    pub async fn set_next_error(&self, error: CatalogError) {
        self.queued_errors.write().await.push_back(error);
    }

    /// Require every query token to match instead of any (a stricter
    /// text-search backend).
    pub async fn set_match_all_tokens(&self, all: bool) {
        *self.match_all_tokens.write().await = all;
    }

    /// Make every rating lookup time out until turned off again.
    pub async fn set_rating_lookups_fail(&self, fail: bool) {
        *self.rating_lookups_fail.write().await = fail;
    }

    /// Configure whether `wait_for_scan` confirms completion.
    pub async fn set_scan_confirms(&self, confirms: bool) {
        *self.scan_confirms.write().await = confirms;
    }

    /// Recorded search queries.
    pub async fn recorded_searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    pub async fn scans_triggered(&self) -> u32 {
        *self.scans_triggered.read().await
    }

    pub async fn scan_waits(&self) -> u32 {
        *self.scan_waits.read().await
    }

    pub async fn album_tracks_calls(&self) -> u32 {
        *self.album_track_fetches.read().await
    }

    /// Playlists created through this catalog, newest last.
    pub async fn playlists_created(&self) -> Vec<(String, Vec<String>)> {
        self.created_playlists.read().await.clone()
    }

    async fn take_next_error(&self) -> Option<CatalogError> {
        self.queued_errors.write().await.pop_front()
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<LibraryTrack>, CatalogError> {
        self.searches.write().await.push(query.to_string());
        if let Some(error) = self.take_next_error().await {
            return Err(error);
        }

        // Naive text search: a track matches when any query token is a
        // substring of its "artist title" haystack, like a forgiving
        // full-text backend would behave.
        let tokens: Vec<String> = query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();

        let match_all = *self.match_all_tokens.read().await;
        let library = self.library.read().await;
        let matches: Vec<LibraryTrack> = library
            .iter()
            .filter(|track| {
                let haystack = format!("{} {}", track.artist, track.title).to_lowercase();
                if match_all {
                    tokens.iter().all(|token| haystack.contains(token))
                } else {
                    tokens.iter().any(|token| haystack.contains(token))
                }
            })
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(matches)
    }

    async fn song_rating(&self, id: &str) -> Result<u32, CatalogError> {
        if *self.rating_lookups_fail.read().await {
            return Err(CatalogError::Timeout);
        }
        if let Some(error) = self.take_next_error().await {
            return Err(error);
        }
        let library = self.library.read().await;
        library
            .iter()
            .find(|track| track.id == id)
            .map(|track| track.rating)
            .ok_or_else(|| CatalogError::InvalidResponse(format!("no song in getSong({id})")))
    }

    async fn start_scan(&self) -> Result<(), CatalogError> {
        *self.scans_triggered.write().await += 1;
        // A scan makes the delivered files visible.
        let mut pending = self.pending_delivery.write().await;
        let mut library = self.library.write().await;
        library.append(&mut pending);
        Ok(())
    }

    async fn wait_for_scan(&self, _ceiling: Duration) -> Result<bool, CatalogError> {
        *self.scan_waits.write().await += 1;
        Ok(*self.scan_confirms.read().await)
    }

    async fn album_page(&self, offset: u32, size: u32) -> Result<Vec<AlbumRef>, CatalogError> {
        if let Some(error) = self.take_next_error().await {
            return Err(error);
        }
        let albums = self.albums.read().await;
        Ok(albums
            .iter()
            .skip(offset as usize)
            .take(size as usize)
            .map(|(id, _)| AlbumRef {
                id: id.clone(),
                name: format!("Album {id}"),
            })
            .collect())
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Vec<LibraryTrack>, CatalogError> {
        *self.album_track_fetches.write().await += 1;
        if let Some(error) = self.take_next_error().await {
            return Err(error);
        }
        let albums = self.albums.read().await;
        Ok(albums
            .iter()
            .find(|(id, _)| id == album_id)
            .map(|(_, tracks)| tracks.clone())
            .unwrap_or_default())
    }

    async fn playlists(&self) -> Result<Vec<PlaylistRef>, CatalogError> {
        let created = self.created_playlists.read().await;
        Ok(created
            .iter()
            .enumerate()
            .map(|(idx, (name, _))| PlaylistRef {
                id: format!("pl-{idx}"),
                name: name.clone(),
            })
            .collect())
    }

    async fn create_playlist(
        &self,
        name: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        if let Some(error) = self.take_next_error().await {
            return Err(error);
        }
        self.created_playlists
            .write()
            .await
            .push((name.to_string(), track_ids.to_vec()));
        Ok(())
    }

    async fn delete_playlist(&self, id: &str) -> Result<(), CatalogError> {
        let mut created = self.created_playlists.write().await;
        if let Some(idx) = id.strip_prefix("pl-").and_then(|n| n.parse::<usize>().ok()) {
            if idx < created.len() {
                created.remove(idx);
            }
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        if let Some(error) = self.take_next_error().await {
            return Err(error);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[tokio::test]
    async fn test_search_matches_tokens() {
        let catalog = MockCatalog::new();
        catalog.add_track(track("t1", "Daft Punk", "One More Time")).await;
        catalog.add_track(track("t2", "Radiohead", "Creep")).await;

        let hits = catalog.search("\"Daft Punk\"", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "t1");

        let none = catalog.search("completely unrelated", 10).await.unwrap();
        assert!(none.is_empty());
        assert_eq!(catalog.search_count().await, 2);
    }

    #[tokio::test]
    async fn test_delivery_appears_after_scan() {
        let catalog = MockCatalog::new();
        catalog.deliver_on_scan(track("t9", "Artist X", "Track Y")).await;

        assert!(catalog.search("\"Artist X\"", 10).await.unwrap().is_empty());
        catalog.start_scan().await.unwrap();
        assert_eq!(catalog.search("\"Artist X\"", 10).await.unwrap().len(), 1);
        assert_eq!(catalog.scans_triggered().await, 1);
    }

    #[tokio::test]
    async fn test_next_error_is_single_shot() {
        let catalog = MockCatalog::new();
        catalog.set_next_error(CatalogError::Timeout).await;

        assert!(catalog.search("anything", 10).await.is_err());
        assert!(catalog.search("anything", 10).await.is_ok());
    }
}
