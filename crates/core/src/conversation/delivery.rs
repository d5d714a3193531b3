//! Sending a downloaded track back to the chat.

use tracing::{info, warn};

use super::menu;
use crate::catalog::{fetch_track_info, Catalog, TrackInfo};
use crate::downloader::DownloadArtifact;
use crate::gateway::{ChatGateway, ChatId, OutgoingMessage};
use crate::metrics;

/// How a delivery ended; selects the follow-up menu prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    SendFailed,
    NotFound,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::SendFailed => "send_failed",
            Self::NotFound => "not_found",
        }
    }

    /// Prompt shown with the menu afterwards.
    pub fn menu_prompt(&self) -> &'static str {
        match self {
            Self::Sent => "✅ Done! What next?",
            Self::SendFailed => "Something went wrong. Choose an option:",
            Self::NotFound => "Choose an option to try again:",
        }
    }
}

/// Caption lines for the fields that are present.
pub fn build_caption(info: Option<&TrackInfo>) -> String {
    let Some(info) = info else {
        return menu::GENERIC_CAPTION.to_string();
    };

    let mut lines = Vec::new();
    if let Some(title) = &info.title {
        lines.push(format!("🎵 {}", title));
    }
    if let Some(artist) = &info.artist {
        lines.push(format!("👤 {}", artist));
    }
    if let Some(album) = &info.album {
        lines.push(format!("💿 {}", album));
    }
    if let Some(duration) = info.formatted_duration() {
        lines.push(format!("⏱ {}", duration));
    }

    if lines.is_empty() {
        menu::GENERIC_CAPTION.to_string()
    } else {
        lines.join("\n")
    }
}

/// Upload `artifact` with a caption, or report the failure in the chat.
pub async fn deliver_artifact(
    gateway: &dyn ChatGateway,
    catalog: &dyn Catalog,
    chat_id: ChatId,
    artifact: Option<&DownloadArtifact>,
) -> DeliveryOutcome {
    let outcome = match artifact {
        Some(artifact) => {
            let info = fetch_track_info(catalog, &artifact.track_id).await;
            let caption = build_caption(info.as_ref());

            match gateway.send_audio(chat_id, artifact.path(), &caption).await {
                Ok(()) => {
                    info!(
                        "Delivered {} ({} bytes) to chat {}",
                        artifact.file_name(),
                        artifact.size_bytes,
                        chat_id
                    );
                    DeliveryOutcome::Sent
                }
                Err(e) => {
                    warn!("Failed to send audio to chat {}: {}", chat_id, e);
                    notify(gateway, chat_id, menu::send_failed(&e.to_string())).await;
                    DeliveryOutcome::SendFailed
                }
            }
        }
        None => {
            notify(gateway, chat_id, menu::DOWNLOAD_FAILED.to_string()).await;
            DeliveryOutcome::NotFound
        }
    };

    metrics::DELIVERIES_TOTAL
        .with_label_values(&[outcome.as_str()])
        .inc();
    outcome
}

async fn notify(gateway: &dyn ChatGateway, chat_id: ChatId, text: String) {
    if let Err(e) = gateway
        .send_message(chat_id, OutgoingMessage::text(text))
        .await
    {
        warn!("Failed to notify chat {}: {}", chat_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TrackId;
    use crate::gateway::GatewayError;
    use crate::testing::{fixtures, MockCatalog, MockGateway, SentItem};
    use tempfile::TempDir;

    fn artifact(dir: &TempDir, name: &str) -> DownloadArtifact {
        let path = dir.path().join(name);
        std::fs::write(&path, b"audio").unwrap();
        DownloadArtifact {
            track_id: TrackId::from(12345),
            path,
            size_bytes: 5,
        }
    }

    #[test]
    fn test_full_caption() {
        let info = fixtures::track_info("Imagine", "John Lennon", "Imagine", 183);
        assert_eq!(
            build_caption(Some(&info)),
            "🎵 Imagine\n👤 John Lennon\n💿 Imagine\n⏱ 3:03"
        );
    }

    #[test]
    fn test_partial_caption_skips_missing_fields() {
        let info = TrackInfo {
            title: Some("Song".to_string()),
            duration_secs: Some(59),
            ..Default::default()
        };
        assert_eq!(build_caption(Some(&info)), "🎵 Song\n⏱ 0:59");
    }

    #[test]
    fn test_generic_caption() {
        assert_eq!(build_caption(None), GENERIC);
        assert_eq!(build_caption(Some(&TrackInfo::default())), GENERIC);
    }

    const GENERIC: &str = menu::GENERIC_CAPTION;

    #[tokio::test]
    async fn test_sends_audio_with_caption() {
        let dir = TempDir::new().unwrap();
        let artifact = artifact(&dir, "12345.mp3");
        let catalog = MockCatalog::new();
        catalog
            .add_track_info(
                artifact.track_id.clone(),
                fixtures::track_info("Imagine", "John Lennon", "Imagine", 183),
            )
            .await;
        let gateway = MockGateway::new();

        let outcome = deliver_artifact(&gateway, &catalog, ChatId(1), Some(&artifact)).await;
        assert_eq!(outcome, DeliveryOutcome::Sent);

        let sent = gateway.sent().await;
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            SentItem::Audio {
                file_name, caption, ..
            } => {
                assert_eq!(file_name, "12345.mp3");
                assert!(caption.contains("Imagine"));
                assert!(caption.contains("John Lennon"));
            }
            other => panic!("Expected audio, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_metadata_still_delivers() {
        let dir = TempDir::new().unwrap();
        let artifact = artifact(&dir, "track.flac");
        let gateway = MockGateway::new();

        let outcome =
            deliver_artifact(&gateway, &MockCatalog::new(), ChatId(1), Some(&artifact)).await;
        assert_eq!(outcome, DeliveryOutcome::Sent);
        assert_eq!(gateway.audio_count().await, 1);
    }

    #[tokio::test]
    async fn test_send_error_reported_raw() {
        let dir = TempDir::new().unwrap();
        let artifact = artifact(&dir, "12345.mp3");
        let gateway = MockGateway::new();
        gateway
            .set_next_audio_error(GatewayError::Api {
                code: 413,
                description: "Request Entity Too Large".to_string(),
            })
            .await;

        let outcome =
            deliver_artifact(&gateway, &MockCatalog::new(), ChatId(1), Some(&artifact)).await;
        assert_eq!(outcome, DeliveryOutcome::SendFailed);

        let texts = gateway.sent_texts().await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Request Entity Too Large"));
        assert_eq!(gateway.audio_count().await, 0);
    }

    #[tokio::test]
    async fn test_no_artifact() {
        let gateway = MockGateway::new();
        let outcome = deliver_artifact(&gateway, &MockCatalog::new(), ChatId(1), None).await;

        assert_eq!(outcome, DeliveryOutcome::NotFound);
        assert_eq!(gateway.sent_texts().await, vec![menu::DOWNLOAD_FAILED]);
    }
}
