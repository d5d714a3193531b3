//! Mock music catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{Catalog, CatalogError, EntityId, SearchResult, TrackId, TrackInfo};

/// A recorded catalog call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCatalogQuery {
    SearchTracks { query: String, limit: u32 },
    ResolveArtist { query: String },
    ArtistTopTracks { artist_id: EntityId, limit: u32 },
    ResolveAlbum { query: String },
    AlbumTracks { album_id: EntityId },
    TrackInfo { track_id: TrackId },
}

#[derive(Debug, Clone)]
struct MockEntity {
    name: String,
    id: EntityId,
    tracks: Vec<SearchResult>,
}

/// Mock implementation of the Catalog trait.
///
/// Artists and albums match when their name contains the query
/// (case-insensitive). Track searches return the configured list cut to
/// the requested limit.
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    track_results: Arc<RwLock<Vec<SearchResult>>>,
    artists: Arc<RwLock<Vec<MockEntity>>>,
    albums: Arc<RwLock<Vec<MockEntity>>>,
    track_infos: Arc<RwLock<HashMap<TrackId, TrackInfo>>>,
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Results for every track search.
    pub async fn set_track_results(&self, results: Vec<SearchResult>) {
        *self.track_results.write().await = results;
    }

    /// Register an artist and its top tracks.
    pub async fn add_artist(&self, name: &str, id: EntityId, tracks: Vec<SearchResult>) {
        self.artists.write().await.push(MockEntity {
            name: name.to_string(),
            id,
            tracks,
        });
    }

    /// Register an album and its tracks.
    pub async fn add_album(&self, name: &str, id: EntityId, tracks: Vec<SearchResult>) {
        self.albums.write().await.push(MockEntity {
            name: name.to_string(),
            id,
            tracks,
        });
    }

    /// Register metadata for a track.
    pub async fn add_track_info(&self, track_id: TrackId, info: TrackInfo) {
        self.track_infos.write().await.insert(track_id, info);
    }

    /// Make the next call fail with this error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded calls.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Number of calls made.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    async fn record(&self, query: RecordedCatalogQuery) -> Result<(), CatalogError> {
        self.queries.write().await.push(query);
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn resolve(entities: &RwLock<Vec<MockEntity>>, query: &str) -> Option<EntityId> {
        let needle = query.to_lowercase();
        entities
            .read()
            .await
            .iter()
            .find(|e| e.name.to_lowercase().contains(&needle))
            .map(|e| e.id)
    }

    async fn tracks_of(
        entities: &RwLock<Vec<MockEntity>>,
        id: EntityId,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        entities
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.tracks.clone())
            .ok_or_else(|| CatalogError::NotFound(format!("entity {}", id)))
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        self.record(RecordedCatalogQuery::SearchTracks {
            query: query.to_string(),
            limit,
        })
        .await?;

        let results = self.track_results.read().await;
        Ok(results.iter().take(limit as usize).cloned().collect())
    }

    async fn resolve_artist(&self, query: &str) -> Result<Option<EntityId>, CatalogError> {
        self.record(RecordedCatalogQuery::ResolveArtist {
            query: query.to_string(),
        })
        .await?;
        Ok(Self::resolve(&self.artists, query).await)
    }

    async fn artist_top_tracks(
        &self,
        artist_id: EntityId,
        limit: u32,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        self.record(RecordedCatalogQuery::ArtistTopTracks { artist_id, limit })
            .await?;
        let mut tracks = Self::tracks_of(&self.artists, artist_id).await?;
        tracks.truncate(limit as usize);
        Ok(tracks)
    }

    async fn resolve_album(&self, query: &str) -> Result<Option<EntityId>, CatalogError> {
        self.record(RecordedCatalogQuery::ResolveAlbum {
            query: query.to_string(),
        })
        .await?;
        Ok(Self::resolve(&self.albums, query).await)
    }

    async fn album_tracks(&self, album_id: EntityId) -> Result<Vec<SearchResult>, CatalogError> {
        self.record(RecordedCatalogQuery::AlbumTracks { album_id })
            .await?;
        Self::tracks_of(&self.albums, album_id).await
    }

    async fn track_info(&self, track_id: &TrackId) -> Result<TrackInfo, CatalogError> {
        self.record(RecordedCatalogQuery::TrackInfo {
            track_id: track_id.clone(),
        })
        .await?;
        self.track_infos
            .read()
            .await
            .get(track_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("track {}", track_id)))
    }
}
