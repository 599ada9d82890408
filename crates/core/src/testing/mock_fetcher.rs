//! Mock track fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, FetchReceipt, TrackFetcher};
use crate::subsonic::LibraryTrack;

use super::mock_catalog::MockCatalog;

/// How the mock answers one fetch request.
#[derive(Clone)]
enum FetchBehavior {
    /// Accept, optionally delivering a track into the linked catalog's
    /// pending queue (visible after the next scan).
    Accept(Option<LibraryTrack>),
    /// The service doesn't know the track.
    Reject,
    /// Network failure.
    Fail,
}

/// Mock implementation of the `TrackFetcher` trait.
///
/// Link it to a [`MockCatalog`] to model the full acquisition round trip:
/// an accepted request queues a track that only becomes searchable after
/// the catalog's next scan.
pub struct MockFetcher {
    catalog: Arc<RwLock<Option<Arc<MockCatalog>>>>,
    behaviors: Arc<RwLock<HashMap<(String, String), FetchBehavior>>>,
    default_accepts: Arc<RwLock<bool>>,
    requests: Arc<RwLock<Vec<(String, String)>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a mock fetcher that accepts everything (without delivery).
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(RwLock::new(None)),
            behaviors: Arc::new(RwLock::new(HashMap::new())),
            default_accepts: Arc::new(RwLock::new(true)),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn key(artist: &str, title: &str) -> (String, String) {
        (artist.to_lowercase(), title.to_lowercase())
    }

    /// Deliver accepted tracks into this catalog's pending queue.
    pub async fn deliver_to(&self, catalog: Arc<MockCatalog>) {
        *self.catalog.write().await = Some(catalog);
    }

    /// Accept this pair and deliver `track` on the catalog's next scan.
    pub async fn accept_with_delivery(&self, artist: &str, title: &str, track: LibraryTrack) {
        self.behaviors
            .write()
            .await
            .insert(Self::key(artist, title), FetchBehavior::Accept(Some(track)));
    }

    /// Reject this pair (service doesn't have it).
    pub async fn reject(&self, artist: &str, title: &str) {
        self.behaviors
            .write()
            .await
            .insert(Self::key(artist, title), FetchBehavior::Reject);
    }

    /// Fail this pair with a connection error.
    pub async fn fail(&self, artist: &str, title: &str) {
        self.behaviors
            .write()
            .await
            .insert(Self::key(artist, title), FetchBehavior::Fail);
    }

    /// Whether unconfigured pairs are accepted (default) or rejected.
    pub async fn set_default_accepts(&self, accepts: bool) {
        *self.default_accepts.write().await = accepts;
    }

    /// Recorded fetch requests, in order.
    pub async fn recorded_requests(&self) -> Vec<(String, String)> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl TrackFetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn request(&self, artist: &str, title: &str) -> Result<FetchReceipt, FetchError> {
        self.requests
            .write()
            .await
            .push((artist.to_string(), title.to_string()));

        let behavior = {
            let behaviors = self.behaviors.read().await;
            behaviors.get(&Self::key(artist, title)).cloned()
        };

        let behavior = match behavior {
            Some(b) => b,
            None if *self.default_accepts.read().await => FetchBehavior::Accept(None),
            None => FetchBehavior::Reject,
        };

        match behavior {
            FetchBehavior::Accept(delivery) => {
                if let Some(track) = delivery {
                    if let Some(catalog) = self.catalog.read().await.as_ref() {
                        catalog.deliver_on_scan(track).await;
                    }
                }
                let reference = format!("mock-{}", self.requests.read().await.len());
                Ok(FetchReceipt { reference })
            }
            FetchBehavior::Reject => Err(FetchError::NotFound),
            FetchBehavior::Fail => {
                Err(FetchError::ConnectionFailed("simulated failure".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Catalog;

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
    async fn test_accepts_by_default_and_records() {
        let fetcher = MockFetcher::new();
        let receipt = fetcher.request("Artist", "Track").await.unwrap();
        assert!(receipt.reference.starts_with("mock-"));
        assert_eq!(fetcher.recorded_requests().await, vec![(
            "Artist".to_string(),
            "Track".to_string()
        )]);
    }

    #[tokio::test]
    async fn test_reject_and_fail_behaviors() {
        let fetcher = MockFetcher::new();
        fetcher.reject("Artist", "Missing").await;
        fetcher.fail("Artist", "Broken").await;

        assert!(matches!(
            fetcher.request("Artist", "Missing").await,
            Err(FetchError::NotFound)
        ));
        assert!(matches!(
            fetcher.request("artist", "broken").await,
            Err(FetchError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_delivery_round_trip() {
        let catalog = Arc::new(MockCatalog::new());
        let fetcher = MockFetcher::new();
        fetcher.deliver_to(Arc::clone(&catalog)).await;
        fetcher
            .accept_with_delivery("Artist X", "Track Y", track("t9", "Artist X", "Track Y"))
            .await;

        fetcher.request("Artist X", "Track Y").await.unwrap();
        assert!(catalog.search("\"Artist X\"", 10).await.unwrap().is_empty());

        catalog.start_scan().await.unwrap();
        let hits = catalog.search("\"Artist X\"", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "t9");
    }
}
