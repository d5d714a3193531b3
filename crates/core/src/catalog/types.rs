//! Types shared by the catalog client and its callers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of characters accepted in a track identifier.
const MAX_TRACK_ID_LEN: usize = 20;

/// Which kind of catalog lookup a search runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Free-text track search.
    Track,
    /// Resolve an artist, then list their top tracks.
    Artist,
    /// Resolve an album, then list its tracks.
    Album,
}

impl SearchMode {
    /// All modes, in menu order.
    pub const ALL: [SearchMode; 3] = [SearchMode::Track, SearchMode::Artist, SearchMode::Album];

    /// Stable lowercase name, used in callback data and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Artist => "artist",
            Self::Album => "album",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(Self::Track),
            "artist" => Ok(Self::Artist),
            "album" => Ok(Self::Album),
            _ => Err(()),
        }
    }
}

/// Rejected track identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid track id: {0:?}")]
pub struct InvalidTrackId(pub String);

/// Opaque catalog track identifier.
///
/// Only digit strings are accepted, so a `TrackId` can be embedded in a URL
/// or a process argument as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackId(String);

impl TrackId {
    /// Validate a raw identifier.
    pub fn parse(raw: &str) -> Result<Self, InvalidTrackId> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_TRACK_ID_LEN
            && raw.bytes().all(|b| b.is_ascii_digit());

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidTrackId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for TrackId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl TryFrom<String> for TrackId {
    type Error = InvalidTrackId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TrackId> for String {
    fn from(id: TrackId) -> Self {
        id.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Artist or album identifier returned by a resolve step.
pub type EntityId = u64;

/// One selectable track in a result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: TrackId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

impl SearchResult {
    /// Button label for the selection list. `index` is 1-based.
    pub fn label(&self, index: usize) -> String {
        format!(
            "{}. {} - {}",
            index,
            self.title,
            self.artist.as_deref().unwrap_or_default()
        )
    }
}

/// Track metadata used for the delivery caption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

impl TrackInfo {
    /// Duration as `m:ss`.
    pub fn formatted_duration(&self) -> Option<String> {
        self.duration_secs.map(format_duration)
    }
}

/// Format seconds as minutes and zero-padded seconds.
pub fn format_duration(total_secs: u32) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
