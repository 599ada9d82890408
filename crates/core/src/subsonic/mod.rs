//! Subsonic catalog abstraction.
//!
//! This module provides a `Catalog` trait for the read/search/scan/playlist
//! surface of a Subsonic-compatible music server, plus the HTTP client
//! implementation used against real servers (Navidrome, Airsonic, ...).

mod auth;
mod client;
mod types;

pub use auth::auth_params;
pub use client::SubsonicClient;
pub use types::*;
