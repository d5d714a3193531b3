//! Per-chat session storage.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use super::state::{ConversationState, Session};
use crate::gateway::ChatId;

/// Sessions keyed by chat.
///
/// The lock is never held across an await point.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, Session>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChatId, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state of a chat, creating the session on first contact.
    pub fn state(&self, chat_id: ChatId) -> ConversationState {
        let now = Utc::now();
        let mut sessions = self.lock();
        let session = sessions.entry(chat_id).or_insert_with(|| Session::new(now));
        session.last_seen = now;
        session.state
    }

    pub fn set_state(&self, chat_id: ChatId, state: ConversationState) {
        let now = Utc::now();
        let mut sessions = self.lock();
        let session = sessions.entry(chat_id).or_insert_with(|| Session::new(now));
        debug!(
            "Chat {} state {} -> {}",
            chat_id,
            session.state.as_str(),
            state.as_str()
        );
        session.state = state;
        session.last_seen = now;
    }

    /// Snapshot of a session, without touching it.
    pub fn get(&self, chat_id: ChatId) -> Option<Session> {
        self.lock().get(&chat_id).cloned()
    }

    /// Drop sessions idle for longer than the TTL.
    pub fn prune_idle(&self) -> usize {
        self.prune_idle_at(Utc::now())
    }

    /// Drop sessions last seen before `now - ttl`.
    pub fn prune_idle_at(&self, now: DateTime<Utc>) -> usize {
        let cutoff = match chrono::Duration::from_std(self.idle_ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
        {
            Some(cutoff) => cutoff,
            None => return 0,
        };
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.last_seen >= cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            debug!("Pruned {} idle sessions", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
