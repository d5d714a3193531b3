//! Music catalog lookups.
//!
//! The `Catalog` trait exposes the individual stages (search, resolve, fetch)
//! and `search_catalog` composes them per `SearchMode`, collapsing every
//! failure into an empty result list.

mod deezer;
mod search;
mod types;

pub use deezer::{DeezerClient, DeezerConfig};
pub use search::{search_catalog, fetch_track_info, MAX_DISPLAYED_RESULTS};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Catalog returned an error payload or a non-success status.
    #[error("API error: {code} - {message}")]
    ApiError { code: u32, message: String },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Read-only catalog operations.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Search tracks by free text.
    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SearchResult>, CatalogError>;

    /// Resolve free text to the best-ranked artist, if any.
    async fn resolve_artist(&self, query: &str) -> Result<Option<EntityId>, CatalogError>;

    /// Top tracks of an artist.
    async fn artist_top_tracks(
        &self,
        artist_id: EntityId,
        limit: u32,
    ) -> Result<Vec<SearchResult>, CatalogError>;

    /// Resolve free text to the best-ranked album, if any.
    async fn resolve_album(&self, query: &str) -> Result<Option<EntityId>, CatalogError>;

    /// Every track of an album.
    async fn album_tracks(&self, album_id: EntityId) -> Result<Vec<SearchResult>, CatalogError>;

    /// Detail lookup for a single track.
    async fn track_info(&self, track_id: &TrackId) -> Result<TrackInfo, CatalogError>;
}
