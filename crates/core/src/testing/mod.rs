//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the catalog, acquirer and
//! chat gateway traits, so conversations can be driven end to end without
//! network access or the external download tool.
//!
//! # Example
//!
//! ```rust,ignore
//! use tunegrab_core::testing::{fixtures, MockAcquirer, MockCatalog, MockGateway};
//!
//! let catalog = MockCatalog::new();
//! catalog.set_track_results(vec![fixtures::search_result(1, "Imagine", "John Lennon")]).await;
//!
//! let acquirer = MockAcquirer::new();
//! acquirer.set_behavior(AcquirerBehavior::WriteFile("1.mp3".into())).await;
//!
//! let gateway = MockGateway::new();
//! gateway.push_updates(vec![fixtures::command(1, "start")]).await;
//! ```

mod mock_acquirer;
mod mock_catalog;
mod mock_gateway;

pub use mock_acquirer::{AcquirerBehavior, MockAcquirer, RecordedAcquisition};
pub use mock_catalog::{MockCatalog, RecordedCatalogQuery};
pub use mock_gateway::{MockGateway, SentItem};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{SearchResult, TrackId, TrackInfo};
    use crate::gateway::{ChatId, IncomingUpdate, UpdateKind};

    /// Create a search result.
    pub fn search_result(id: u64, title: &str, artist: &str) -> SearchResult {
        SearchResult {
            id: TrackId::from(id),
            title: title.to_string(),
            artist: Some(artist.to_string()),
        }
    }

    /// `count` results titled "Song 1".."Song N" with ids 1..=N.
    pub fn numbered_results(count: u64, artist: &str) -> Vec<SearchResult> {
        (1..=count)
            .map(|i| search_result(i, &format!("Song {}", i), artist))
            .collect()
    }

    /// Fully populated track metadata.
    pub fn track_info(title: &str, artist: &str, album: &str, duration_secs: u32) -> TrackInfo {
        TrackInfo {
            title: Some(title.to_string()),
            artist: Some(artist.to_string()),
            album: Some(album.to_string()),
            duration_secs: Some(duration_secs),
        }
    }

    fn update(chat: i64, kind: UpdateKind) -> IncomingUpdate {
        IncomingUpdate {
            update_id: 0,
            chat_id: ChatId(chat),
            kind,
        }
    }

    /// A `/name` command.
    pub fn command(chat: i64, name: &str) -> IncomingUpdate {
        update(chat, UpdateKind::Command(name.to_string()))
    }

    /// A free-text message.
    pub fn text(chat: i64, text: &str) -> IncomingUpdate {
        update(chat, UpdateKind::Text(text.to_string()))
    }

    /// A button press carrying `data`.
    pub fn callback(chat: i64, data: &str) -> IncomingUpdate {
        update(
            chat,
            UpdateKind::Callback {
                id: format!("cb-{}", data),
                data: data.to_string(),
            },
        )
    }
}
