//! Inline button payloads.

use crate::catalog::SearchMode;

/// Action carried by an inline button.
///
/// Encoded as a short token (`search:track`, `track:12345`, `back`) so it
/// fits the platform's callback data limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Start a search in the given mode.
    Search(SearchMode),
    /// Download a track. The id is raw here and validated downstream.
    Track(String),
    /// Return to the menu.
    Back,
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            Self::Search(mode) => format!("search:{}", mode.as_str()),
            Self::Track(id) => format!("track:{}", id),
            Self::Back => "back".to_string(),
        }
    }

    /// Parse a token; unknown tokens yield `None`.
    pub fn parse(data: &str) -> Option<Self> {
        if data == "back" {
            return Some(Self::Back);
        }
        let (kind, value) = data.split_once(':')?;
        match kind {
            "search" => value.parse().ok().map(Self::Search),
            "track" if !value.is_empty() => Some(Self::Track(value.to_string())),
            _ => None,
        }
    }
}
