//! Track acquisition.
//!
//! The fetch service pulls missing tracks into the library out of band. From
//! this side an acquisition is fire-and-forget: an accepted request means
//! "queued", never "file present". The library rescan afterwards is the only
//! confirmation barrier.

mod subsonic;
mod types;

pub use subsonic::SubsonicFetcher;
pub use types::{FetchError, FetchReceipt, TrackFetcher};
