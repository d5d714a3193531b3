//! Mode-driven search pipeline over a `Catalog`.

use tracing::{debug, warn};

use super::types::{SearchMode, SearchResult, TrackId, TrackInfo};
use super::{Catalog, CatalogError};
use crate::metrics;

/// Result lists are cut to this many entries before rendering.
pub const MAX_DISPLAYED_RESULTS: usize = 10;

/// Run a search for `query` in the given mode.
///
/// Artist and album modes resolve the query to the first-ranked entity and
/// then fetch its tracks. There is no disambiguation: whatever the catalog
/// ranks first wins. Every error degrades to an empty list.
pub async fn search_catalog(
    catalog: &dyn Catalog,
    mode: SearchMode,
    query: &str,
    limit: u32,
) -> Vec<SearchResult> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let outcome = match mode {
        SearchMode::Track => catalog.search_tracks(query, limit).await,
        SearchMode::Artist => artist_tracks(catalog, query, limit).await,
        SearchMode::Album => album_tracks(catalog, query).await,
    };

    match outcome {
        Ok(results) => {
            let label = if results.is_empty() { "empty" } else { "found" };
            metrics::SEARCHES_TOTAL
                .with_label_values(&[mode.as_str(), label])
                .inc();
            debug!(
                "Search mode={} query='{}' returned {} results",
                mode,
                query,
                results.len()
            );
            results
        }
        Err(CatalogError::NotFound(what)) => {
            metrics::SEARCHES_TOTAL
                .with_label_values(&[mode.as_str(), "empty"])
                .inc();
            debug!("Search mode={} query='{}': not found ({})", mode, query, what);
            Vec::new()
        }
        Err(e) => {
            metrics::SEARCHES_TOTAL
                .with_label_values(&[mode.as_str(), "error"])
                .inc();
            warn!("Search mode={} query='{}' failed: {}", mode, query, e);
            Vec::new()
        }
    }
}

async fn artist_tracks(
    catalog: &dyn Catalog,
    query: &str,
    limit: u32,
) -> Result<Vec<SearchResult>, CatalogError> {
    match catalog.resolve_artist(query).await? {
        Some(artist_id) => catalog.artist_top_tracks(artist_id, limit).await,
        None => {
            debug!("No artist matches '{}'", query);
            Ok(Vec::new())
        }
    }
}

async fn album_tracks(
    catalog: &dyn Catalog,
    query: &str,
) -> Result<Vec<SearchResult>, CatalogError> {
    match catalog.resolve_album(query).await? {
        Some(album_id) => catalog.album_tracks(album_id).await,
        None => {
            debug!("No album matches '{}'", query);
            Ok(Vec::new())
        }
    }
}

/// Look up caption metadata; failures yield `None`.
pub async fn fetch_track_info(catalog: &dyn Catalog, track_id: &TrackId) -> Option<TrackInfo> {
    match catalog.track_info(track_id).await {
        Ok(info) => Some(info),
        Err(e) => {
            debug!("Track info for {} unavailable: {}", track_id, e);
            None
        }
    }
}
