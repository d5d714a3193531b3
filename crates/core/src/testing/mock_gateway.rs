//! Mock chat gateway for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::gateway::{
    ChatGateway, ChatId, GatewayError, IncomingUpdate, OutgoingMessage, UpdateBatch,
};

/// Something the bot sent, in send order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentItem {
    Message {
        chat_id: ChatId,
        message: OutgoingMessage,
    },
    Audio {
        chat_id: ChatId,
        file_name: String,
        caption: String,
        size_bytes: u64,
    },
}

impl SentItem {
    /// Message text, if this is a text message.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Message { message, .. } => Some(&message.text),
            Self::Audio { .. } => None,
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Audio { .. })
    }
}

/// Mock implementation of the ChatGateway trait.
///
/// Queued batches are handed out one per poll. With nothing queued a poll
/// waits briefly and returns an empty batch, like an idle long poll.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    queued: Arc<RwLock<VecDeque<UpdateBatch>>>,
    next_update_id: Arc<RwLock<i64>>,
    polled_offsets: Arc<RwLock<Vec<Option<i64>>>>,
    sent: Arc<RwLock<Vec<SentItem>>>,
    answered: Arc<RwLock<Vec<String>>>,
    next_poll_error: Arc<RwLock<Option<GatewayError>>>,
    message_errors: Arc<RwLock<VecDeque<GatewayError>>>,
    next_audio_error: Arc<RwLock<Option<GatewayError>>>,
}

impl MockGateway {
    /// Create a new mock gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one batch of updates. Update ids are assigned in sequence.
    pub async fn push_updates(&self, updates: Vec<IncomingUpdate>) {
        let mut next_id = self.next_update_id.write().await;
        let updates: Vec<IncomingUpdate> = updates
            .into_iter()
            .map(|mut u| {
                *next_id += 1;
                u.update_id = *next_id;
                u
            })
            .collect();

        let batch = UpdateBatch {
            next_offset: updates.last().map(|u| u.update_id + 1),
            updates,
        };
        self.queued.write().await.push_back(batch);
    }

    /// Make the next poll fail.
    pub async fn set_next_poll_error(&self, error: GatewayError) {
        *self.next_poll_error.write().await = Some(error);
    }

    /// Make a text send fail. Queued errors are used one per send, in order.
    pub async fn queue_message_error(&self, error: GatewayError) {
        self.message_errors.write().await.push_back(error);
    }

    /// Make the next audio upload fail.
    pub async fn set_next_audio_error(&self, error: GatewayError) {
        *self.next_audio_error.write().await = Some(error);
    }

    /// Everything sent so far.
    pub async fn sent(&self) -> Vec<SentItem> {
        self.sent.read().await.clone()
    }

    /// Texts of sent messages, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent
            .read()
            .await
            .iter()
            .filter_map(|s| s.text().map(str::to_string))
            .collect()
    }

    /// Number of audio uploads.
    pub async fn audio_count(&self) -> usize {
        self.sent.read().await.iter().filter(|s| s.is_audio()).count()
    }

    /// Most recent text message.
    pub async fn last_message(&self) -> Option<OutgoingMessage> {
        self.sent.read().await.iter().rev().find_map(|s| match s {
            SentItem::Message { message, .. } => Some(message.clone()),
            SentItem::Audio { .. } => None,
        })
    }

    /// Callback ids that were acknowledged.
    pub async fn answered_callbacks(&self) -> Vec<String> {
        self.answered.read().await.clone()
    }

    /// Offsets passed to each poll.
    pub async fn polled_offsets(&self) -> Vec<Option<i64>> {
        self.polled_offsets.read().await.clone()
    }

    /// Forget everything sent so far.
    pub async fn clear_sent(&self) {
        self.sent.write().await.clear();
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    async fn poll_updates(&self, offset: Option<i64>) -> Result<UpdateBatch, GatewayError> {
        self.polled_offsets.write().await.push(offset);

        if let Some(error) = self.next_poll_error.write().await.take() {
            return Err(error);
        }

        let next = self.queued.write().await.pop_front();
        match next {
            Some(batch) => Ok(batch),
            None => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(UpdateBatch::default())
            }
        }
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        message: OutgoingMessage,
    ) -> Result<(), GatewayError> {
        if let Some(error) = self.message_errors.write().await.pop_front() {
            return Err(error);
        }

        self.sent
            .write()
            .await
            .push(SentItem::Message { chat_id, message });
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        audio: &Path,
        caption: &str,
    ) -> Result<(), GatewayError> {
        if let Some(error) = self.next_audio_error.write().await.take() {
            return Err(error);
        }

        let size_bytes = tokio::fs::metadata(audio).await?.len();
        self.sent.write().await.push(SentItem::Audio {
            chat_id,
            file_name: audio
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            caption: caption.to_string(),
            size_bytes,
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), GatewayError> {
        self.answered.write().await.push(callback_id.to_string());
        Ok(())
    }
}
