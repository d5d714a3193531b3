//! Chat gateway abstraction.
//!
//! This module provides a `ChatGateway` trait for receiving user updates and
//! sending replies, with a Telegram Bot API implementation.

mod telegram;
mod types;

pub use telegram::{TelegramConfig, TelegramGateway};
pub use types::*;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while talking to the chat platform.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform rejected the call.
    #[error("API error {code}: {description}")]
    Api { code: i32, description: String },

    /// The response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Reading a local file for upload failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport for chat updates and replies.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Long-poll for updates starting at `offset` (exclusive of older ones).
    async fn poll_updates(&self, offset: Option<i64>) -> Result<UpdateBatch, GatewayError>;

    /// Send a text message, optionally with an inline keyboard.
    async fn send_message(
        &self,
        chat_id: ChatId,
        message: OutgoingMessage,
    ) -> Result<(), GatewayError>;

    /// Upload a local audio file to the chat.
    async fn send_audio(
        &self,
        chat_id: ChatId,
        audio: &Path,
        caption: &str,
    ) -> Result<(), GatewayError>;

    /// Acknowledge a button press.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), GatewayError>;
}
