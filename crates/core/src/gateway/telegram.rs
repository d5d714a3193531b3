//! Telegram Bot API gateway.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::types::{ChatId, IncomingUpdate, OutgoingMessage, UpdateBatch, UpdateKind};
use super::{ChatGateway, GatewayError};

/// Telegram gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from BotFather.
    #[serde(default)]
    pub token: String,
    /// Bot API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Long-poll timeout passed to getUpdates.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// HTTP timeout for regular calls. Long polls add `poll_timeout_secs`.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Pause after a failed poll.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    120
}

fn default_error_backoff() -> u64 {
    5
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            poll_timeout_secs: default_poll_timeout(),
            request_timeout_secs: default_request_timeout(),
            error_backoff_secs: default_error_backoff(),
        }
    }
}

/// Telegram Bot API client.
pub struct TelegramGateway {
    client: Client,
    /// `{api_url}/bot{token}`; never logged.
    bot_url: String,
    poll_timeout_secs: u64,
    request_timeout: Duration,
}

impl TelegramGateway {
    /// Create a new gateway.
    pub fn new(config: &TelegramConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            bot_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.token
            ),
            poll_timeout_secs: config.poll_timeout_secs,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.bot_url, method)
    }

    /// POST a JSON body to a Bot API method.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<T, GatewayError> {
        debug!("Telegram call: {}", method);
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.without_url()))?;

        decode_response(response).await
    }
}

/// Unwrap the `{ok, result, description}` envelope.
async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    let envelope: TgResponse<T> = response
        .json()
        .await
        .map_err(|e| GatewayError::Malformed(format!("HTTP {}: {}", status, e.without_url())))?;

    envelope.into_result()
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn poll_updates(&self, offset: Option<i64>) -> Result<UpdateBatch, GatewayError> {
        let mut body = json!({
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        let timeout = self.request_timeout + Duration::from_secs(self.poll_timeout_secs);
        let updates: Vec<TgUpdate> = self.call("getUpdates", &body, timeout).await?;
        Ok(into_batch(updates))
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        message: OutgoingMessage,
    ) -> Result<(), GatewayError> {
        let mut body = json!({
            "chat_id": chat_id.0,
            "text": message.text,
        });
        if let Some(mode) = message.parse_mode {
            body["parse_mode"] = json!(mode.as_str());
        }
        if let Some(keyboard) = &message.keyboard {
            body["reply_markup"] = keyboard.to_reply_markup();
        }

        let _: serde_json::Value = self
            .call("sendMessage", &body, self.request_timeout)
            .await?;
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        audio: &Path,
        caption: &str,
    ) -> Result<(), GatewayError> {
        let file = tokio::fs::File::open(audio).await?;
        let length = file.metadata().await?.len();
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        let part = multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(ReaderStream::new(file)),
            length,
        )
        .file_name(file_name)
        .mime_str(audio_mime(audio))?;

        let form = multipart::Form::new()
            .text("chat_id", chat_id.0.to_string())
            .text("caption", caption.to_string())
            .part("audio", part);

        debug!("Uploading {} bytes to chat {}", length, chat_id);
        let response = self
            .client
            .post(self.method_url("sendAudio"))
            .timeout(self.request_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.without_url()))?;

        let _: serde_json::Value = decode_response(response).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), GatewayError> {
        let body = json!({ "callback_query_id": callback_id });
        let _: bool = self
            .call("answerCallbackQuery", &body, self.request_timeout)
            .await?;
        Ok(())
    }
}

fn audio_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("flac") => "audio/flac",
        _ => "audio/mpeg",
    }
}

/// Convert raw updates, keeping the offset past every one of them.
fn into_batch(updates: Vec<TgUpdate>) -> UpdateBatch {
    let next_offset = updates.iter().map(|u| u.update_id + 1).max();
    let updates = updates
        .into_iter()
        .filter_map(TgUpdate::into_incoming)
        .collect();

    UpdateBatch {
        next_offset,
        updates,
    }
}

// ============================================================================
// Telegram API Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i32>,
}

impl<T> TgResponse<T> {
    fn into_result(self) -> Result<T, GatewayError> {
        if !self.ok {
            return Err(GatewayError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
            });
        }
        self.result
            .ok_or_else(|| GatewayError::Malformed("ok response without result".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TgUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<TgMessage>,
    #[serde(default)]
    callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    chat: TgChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgCallbackQuery {
    id: String,
    from: TgUser,
    #[serde(default)]
    message: Option<TgMessage>,
    #[serde(default)]
    data: Option<String>,
}

impl TgUpdate {
    /// Non-text messages and callbacks without data are dropped.
    fn into_incoming(self) -> Option<IncomingUpdate> {
        if let Some(query) = self.callback_query {
            let chat_id = query
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(query.from.id);
            return Some(IncomingUpdate {
                update_id: self.update_id,
                chat_id: ChatId(chat_id),
                kind: UpdateKind::Callback {
                    id: query.id,
                    data: query.data?,
                },
            });
        }

        let message = self.message?;
        let text = message.text?;
        Some(IncomingUpdate {
            update_id: self.update_id,
            chat_id: ChatId(message.chat.id),
            kind: UpdateKind::from_message_text(&text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> UpdateBatch {
        let response: TgResponse<Vec<TgUpdate>> = serde_json::from_str(json).unwrap();
        into_batch(response.into_result().unwrap())
    }

    #[test]
    fn test_default_config() {
        let config = TelegramConfig::default();
        assert_eq!(config.api_url, "https://api.telegram.org");
        assert_eq!(config.poll_timeout_secs, 30);
        assert!(config.token.is_empty());
    }

    #[test]
    fn test_parse_text_and_command() {
        let batch = parse(
            r#"{"ok": true, "result": [
                {"update_id": 100, "message": {"message_id": 1, "chat": {"id": 42, "type": "private"}, "text": "/start"}},
                {"update_id": 101, "message": {"message_id": 2, "chat": {"id": 42, "type": "private"}, "text": "Imagine"}}
            ]}"#,
        );

        assert_eq!(batch.next_offset, Some(102));
        assert_eq!(batch.updates.len(), 2);
        assert_eq!(batch.updates[0].chat_id, ChatId(42));
        assert_eq!(batch.updates[0].kind, UpdateKind::Command("start".to_string()));
        assert_eq!(batch.updates[1].kind, UpdateKind::Text("Imagine".to_string()));
    }

    #[test]
    fn test_parse_callback() {
        let batch = parse(
            r#"{"ok": true, "result": [
                {"update_id": 7, "callback_query": {
                    "id": "cb-1",
                    "from": {"id": 42, "is_bot": false, "first_name": "A"},
                    "message": {"message_id": 9, "chat": {"id": -500, "type": "group"}},
                    "data": "track:12345"
                }}
            ]}"#,
        );

        assert_eq!(batch.updates.len(), 1);
        assert_eq!(batch.updates[0].chat_id, ChatId(-500));
        assert_eq!(
            batch.updates[0].kind,
            UpdateKind::Callback {
                id: "cb-1".to_string(),
                data: "track:12345".to_string()
            }
        );
    }

    #[test]
    fn test_dropped_updates_still_advance_offset() {
        let batch = parse(
            r#"{"ok": true, "result": [
                {"update_id": 50, "message": {"message_id": 1, "chat": {"id": 1, "type": "private"}}},
                {"update_id": 51, "edited_message": {}}
            ]}"#,
        );

        assert!(batch.updates.is_empty());
        assert_eq!(batch.next_offset, Some(52));
    }

    #[test]
    fn test_empty_poll_keeps_offset() {
        let batch = parse(r#"{"ok": true, "result": []}"#);
        assert_eq!(batch, UpdateBatch::default());
    }

    #[test]
    fn test_api_error_envelope() {
        let response: TgResponse<Vec<TgUpdate>> = serde_json::from_str(
            r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#,
        )
        .unwrap();

        match response.into_result() {
            Err(GatewayError::Api { code, description }) => {
                assert_eq!(code, 401);
                assert_eq!(description, "Unauthorized");
            }
            other => panic!("Expected Api error, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn test_audio_mime() {
        assert_eq!(audio_mime(Path::new("a/Song.FLAC")), "audio/flac");
        assert_eq!(audio_mime(Path::new("a/Song.mp3")), "audio/mpeg");
    }

    #[test]
    fn test_method_url() {
        let gateway = TelegramGateway::new(&TelegramConfig {
            token: "123:abc".to_string(),
            api_url: "http://localhost:8081/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            gateway.method_url("getUpdates"),
            "http://localhost:8081/bot123:abc/getUpdates"
        );
    }

    // HTTP behavior against a local mock server

    use crate::gateway::{Button, Keyboard};
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123:abc";

    fn gateway_for(server: &MockServer) -> TelegramGateway {
        TelegramGateway::new(&TelegramConfig {
            token: TOKEN.to_string(),
            api_url: server.uri(),
            poll_timeout_secs: 0,
            request_timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": result}))
    }

    async fn recorded_bodies(server: &MockServer) -> Vec<serde_json::Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_poll_sends_offset_and_update_filter() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .and(body_partial_json(json!({
                "offset": 42,
                "allowed_updates": ["message", "callback_query"]
            })))
            .respond_with(ok(json!([
                {"update_id": 42, "message": {"message_id": 1, "chat": {"id": 7, "type": "private"}, "text": "hello"}}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let batch = gateway_for(&mock_server).poll_updates(Some(42)).await.unwrap();

        assert_eq!(batch.next_offset, Some(43));
        assert_eq!(batch.updates[0].kind, UpdateKind::Text("hello".to_string()));
    }

    #[tokio::test]
    async fn test_first_poll_omits_offset() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .respond_with(ok(json!([])))
            .mount(&mock_server)
            .await;

        let batch = gateway_for(&mock_server).poll_updates(None).await.unwrap();
        assert_eq!(batch, UpdateBatch::default());

        let bodies = recorded_bodies(&mock_server).await;
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].get("offset").is_none());
        assert_eq!(bodies[0]["timeout"], 0);
    }

    #[tokio::test]
    async fn test_send_message_with_keyboard() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(json!({
                "chat_id": 42,
                "text": "*Pick one*",
                "parse_mode": "Markdown",
                "reply_markup": {"inline_keyboard": [
                    [{"text": "1. Song", "callback_data": "track:1"}],
                    [{"text": "Back", "callback_data": "menu"}]
                ]}
            })))
            .respond_with(ok(json!({"message_id": 10})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let keyboard = Keyboard::single_column([
            Button::new("1. Song", "track:1"),
            Button::new("Back", "menu"),
        ]);
        gateway_for(&mock_server)
            .send_message(
                ChatId(42),
                OutgoingMessage::markdown("*Pick one*").with_keyboard(keyboard),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_plain_message_has_no_formatting_fields() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ok(json!({"message_id": 11})))
            .mount(&mock_server)
            .await;

        gateway_for(&mock_server)
            .send_message(ChatId(42), OutgoingMessage::text("hi"))
            .await
            .unwrap();

        let bodies = recorded_bodies(&mock_server).await;
        assert_eq!(bodies[0], json!({"chat_id": 42, "text": "hi"}));
    }

    #[tokio::test]
    async fn test_rejected_message_is_api_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: can't parse entities"
            })))
            .mount(&mock_server)
            .await;

        let result = gateway_for(&mock_server)
            .send_message(ChatId(42), OutgoingMessage::markdown("*\\*broken*"))
            .await;

        match result {
            Err(GatewayError::Api { code, description }) => {
                assert_eq!(code, 400);
                assert!(description.contains("can't parse entities"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_response_is_malformed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&mock_server)
            .await;

        let result = gateway_for(&mock_server).poll_updates(None).await;
        assert!(matches!(result, Err(GatewayError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_send_audio_uploads_multipart_form() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("song.flac");
        std::fs::write(&file, b"fLaC-audio-bytes").unwrap();

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendAudio"))
            .and(body_string_contains("name=\"chat_id\""))
            .and(body_string_contains("name=\"caption\""))
            .and(body_string_contains("Daft Punk - One More Time"))
            .and(body_string_contains("name=\"audio\"; filename=\"song.flac\""))
            .and(body_string_contains("audio/flac"))
            .and(body_string_contains("fLaC-audio-bytes"))
            .respond_with(ok(json!({"message_id": 12})))
            .expect(1)
            .mount(&mock_server)
            .await;

        gateway_for(&mock_server)
            .send_audio(ChatId(42), &file, "Daft Punk - One More Time")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_audio_missing_file_is_io_error() {
        let mock_server = MockServer::start().await;
        let dir = tempfile::TempDir::new().unwrap();

        let result = gateway_for(&mock_server)
            .send_audio(ChatId(42), &dir.path().join("gone.mp3"), "x")
            .await;

        assert!(matches!(result, Err(GatewayError::Io(_))));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_answer_callback() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/answerCallbackQuery"))
            .and(body_partial_json(json!({"callback_query_id": "cb-1"})))
            .respond_with(ok(json!(true)))
            .expect(1)
            .mount(&mock_server)
            .await;

        gateway_for(&mock_server)
            .answer_callback("cb-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        let mock_server = MockServer::start().await;
        let gateway = gateway_for(&mock_server);
        drop(mock_server);

        let error = gateway.poll_updates(None).await.unwrap_err();

        assert!(matches!(error, GatewayError::Http(_)));
        assert!(!error.to_string().contains(TOKEN));
    }
}
