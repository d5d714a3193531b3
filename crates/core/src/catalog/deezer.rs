//! Deezer public API client.
//!
//! The search and lookup endpoints need no authentication. Every response is
//! JSON; list endpoints wrap results in a `data` array and failures come back
//! as HTTP 200 with an `error` object.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{EntityId, SearchResult, TrackId, TrackInfo};
use super::{Catalog, CatalogError};

/// Deezer "no data" error code.
const DEEZER_NO_DATA: u32 = 800;

/// Deezer API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeezerConfig {
    /// Base URL (default: https://api.deezer.com).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Result limit for track searches and artist top tracks.
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
}

fn default_base_url() -> String {
    "https://api.deezer.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_result_limit() -> u32 {
    10
}

impl Default for DeezerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            result_limit: default_result_limit(),
        }
    }
}

/// Deezer API client.
pub struct DeezerClient {
    client: Client,
    base_url: String,
}

impl DeezerClient {
    /// Create a new Deezer client.
    pub fn new(config: &DeezerConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET an endpoint and decode it, mapping Deezer error payloads.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Deezer request: path={}", path);

        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if status == 404 {
            return Err(CatalogError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                code: u32::from(status.as_u16()),
                message: body,
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to read response body: {}", e))
        })?;

        if let Some(error) = body.get("error") {
            let error: DzError = serde_json::from_value(error.clone()).unwrap_or_default();
            if error.code == DEEZER_NO_DATA {
                return Err(CatalogError::NotFound(path.to_string()));
            }
            return Err(CatalogError::ApiError {
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(body)
            .map_err(|e| CatalogError::ParseError(format!("Unexpected response shape: {}", e)))
    }

    async fn track_list(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<SearchResult>, CatalogError> {
        let list: DzList<DzTrack> = self.get_json(path, query).await?;
        Ok(list.data.into_iter().filter_map(DzTrack::into_result).collect())
    }

    async fn first_entity(&self, path: &str, query: &str) -> Result<Option<EntityId>, CatalogError> {
        let list: DzList<DzEntity> = self
            .get_json(
                path,
                &[
                    ("q", query.to_string()),
                    ("index", "0".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        Ok(list.data.first().map(|e| e.id))
    }
}

#[async_trait]
impl Catalog for DeezerClient {
    async fn search_tracks(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        self.track_list(
            "/search/track",
            &[
                ("q", query.to_string()),
                ("index", "0".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn resolve_artist(&self, query: &str) -> Result<Option<EntityId>, CatalogError> {
        self.first_entity("/search/artist", query).await
    }

    async fn artist_top_tracks(
        &self,
        artist_id: EntityId,
        limit: u32,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        self.track_list(
            &format!("/artist/{}/top", artist_id),
            &[("limit", limit.to_string())],
        )
        .await
    }

    async fn resolve_album(&self, query: &str) -> Result<Option<EntityId>, CatalogError> {
        self.first_entity("/search/album", query).await
    }

    async fn album_tracks(&self, album_id: EntityId) -> Result<Vec<SearchResult>, CatalogError> {
        self.track_list(&format!("/album/{}/tracks", album_id), &[])
            .await
    }

    async fn track_info(&self, track_id: &TrackId) -> Result<TrackInfo, CatalogError> {
        let track: DzTrack = self
            .get_json(&format!("/track/{}", track_id), &[])
            .await?;
        Ok(track.into_info())
    }
}

// ============================================================================
// Deezer API Response Types (private)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct DzError {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct DzList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DzEntity {
    id: EntityId,
}

#[derive(Debug, Deserialize)]
struct DzTrack {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    artist: Option<DzNamed>,
    #[serde(default)]
    album: Option<DzAlbum>,
}

#[derive(Debug, Deserialize)]
struct DzNamed {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DzAlbum {
    #[serde(default)]
    title: Option<String>,
}

impl DzTrack {
    /// User-uploaded tracks carry negative ids and cannot be fetched.
    fn into_result(self) -> Option<SearchResult> {
        let id = match u64::try_from(self.id) {
            Ok(id) if id > 0 => TrackId::from(id),
            _ => {
                debug!("Skipping track with unusable id {}", self.id);
                return None;
            }
        };

        Some(SearchResult {
            id,
            title: self.title.unwrap_or_default(),
            artist: self.artist.and_then(|a| a.name),
        })
    }

    fn into_info(self) -> TrackInfo {
        TrackInfo {
            title: self.title,
            artist: self.artist.and_then(|a| a.name),
            album: self.album.and_then(|a| a.title),
            duration_secs: self.duration,
        }
    }
}
