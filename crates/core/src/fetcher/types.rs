//! Types for the track acquisition system.

use async_trait::async_trait;
use thiserror::Error;

/// Proof that a fetch request was accepted by the service.
#[derive(Debug, Clone)]
pub struct FetchReceipt {
    /// Service-side reference for the queued request.
    pub reference: String,
}

/// Errors that can occur requesting a track fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The service doesn't know the track; nothing was queued.
    #[error("Track not found by fetch service")]
    NotFound,

    #[error("Fetch service connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Fetch service request timeout")]
    Timeout,

    #[error("Fetch service API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Unexpected fetch service response: {0}")]
    InvalidResponse(String),
}

/// Trait for services that can pull a missing track into the library.
#[async_trait]
pub trait TrackFetcher: Send + Sync {
    /// Service name for logging.
    fn name(&self) -> &str;

    /// Ask the service to fetch `artist - title`.
    ///
    /// `Ok` means the request was accepted and queued; whether the file
    /// actually lands in the library is only observable via a later
    /// catalog rescan.
    async fn request(&self, artist: &str, title: &str) -> Result<FetchReceipt, FetchError>;
}
