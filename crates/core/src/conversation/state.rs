//! Conversation states and inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::callback::CallbackAction;
use crate::catalog::SearchMode;
use crate::gateway::UpdateKind;

/// Where a chat is in the menu / search / deliver cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "mode", rename_all = "snake_case")]
pub enum ConversationState {
    /// Menu shown, no search mode active.
    #[default]
    Menu,
    /// Next free text is a query in this mode.
    AwaitingQuery(SearchMode),
    /// A result list is on screen.
    ShowingResults(SearchMode),
    /// A download and upload are in progress.
    Delivering,
}

impl ConversationState {
    /// The active search mode, if any.
    pub fn search_mode(&self) -> Option<SearchMode> {
        match self {
            Self::AwaitingQuery(mode) => Some(*mode),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::AwaitingQuery(_) => "awaiting_query",
            Self::ShowingResults(_) => "showing_results",
            Self::Delivering => "delivering",
        }
    }
}

/// A state machine input derived from an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// `/start` or `/menu`.
    Start,
    Text(String),
    Callback(CallbackAction),
}

impl Input {
    /// Map an update to an input. Unknown commands and callback tokens map
    /// to `None`.
    pub fn from_update(kind: &UpdateKind) -> Option<Self> {
        match kind {
            UpdateKind::Command(name) => match name.as_str() {
                "start" | "menu" => Some(Self::Start),
                _ => None,
            },
            UpdateKind::Text(text) => Some(Self::Text(text.clone())),
            UpdateKind::Callback { data, .. } => CallbackAction::parse(data).map(Self::Callback),
        }
    }
}

/// Per-chat conversation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub state: ConversationState,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: ConversationState::Menu,
            last_seen: now,
        }
    }
}
