//! Download orchestration: purge, acquire, wait for the artifact.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::DownloaderConfig;
use super::error::DownloadError;
use super::poll::{poll_until, PollPolicy};
use super::staging::{find_artifact, purge_staging};
use super::traits::{AcquisitionRequest, Acquirer};
use super::types::DownloadArtifact;
use crate::catalog::TrackId;
use crate::metrics;

/// Turns a track id into a file in the staging directory.
///
/// The staging directory is shared: running two downloads at once lets one
/// purge or pick up the other's file. Callers serialize downloads.
pub struct DownloadOrchestrator {
    acquirer: Arc<dyn Acquirer>,
    staging_dir: PathBuf,
    track_url_base: String,
    accepted_extensions: Vec<String>,
    poll_policy: PollPolicy,
}

impl DownloadOrchestrator {
    pub fn new(config: &DownloaderConfig, acquirer: Arc<dyn Acquirer>) -> Self {
        Self {
            acquirer,
            staging_dir: config.staging_dir.clone(),
            track_url_base: config.track_url_base.trim_end_matches('/').to_string(),
            accepted_extensions: config.accepted_extensions.clone(),
            poll_policy: config.poll_policy(),
        }
    }

    fn track_url(&self, track_id: &TrackId) -> String {
        format!("{}/{}", self.track_url_base, track_id)
    }

    /// Download a track given its raw identifier.
    ///
    /// Identifiers that are not plain digit strings are rejected before any
    /// filesystem or process work.
    pub async fn download(&self, raw_id: &str) -> Option<DownloadArtifact> {
        match TrackId::parse(raw_id).map_err(DownloadError::from) {
            Ok(track_id) => self.download_track(&track_id).await,
            Err(e) => {
                warn!("Rejecting download request: {}", e);
                metrics::DOWNLOADS_TOTAL.with_label_values(&["rejected"]).inc();
                None
            }
        }
    }

    /// Download an already validated track.
    pub async fn download_track(&self, track_id: &TrackId) -> Option<DownloadArtifact> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%request_id, %track_id, "Starting download");

        let artifact = self.run(track_id, request_id).await;

        metrics::DOWNLOAD_DURATION.observe(started.elapsed().as_secs_f64());
        match &artifact {
            Some(a) => {
                metrics::DOWNLOADS_TOTAL.with_label_values(&["success"]).inc();
                info!(
                    %request_id,
                    %track_id,
                    "Download finished in {:?}: {:?} ({} bytes)",
                    started.elapsed(),
                    a.path,
                    a.size_bytes
                );
            }
            None => {
                metrics::DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
                warn!(%request_id, %track_id, "Download produced no file");
            }
        }
        artifact
    }

    async fn run(&self, track_id: &TrackId, request_id: Uuid) -> Option<DownloadArtifact> {
        if let Err(e) = tokio::fs::create_dir_all(&self.staging_dir).await {
            warn!(%request_id, "Cannot create staging dir {:?}: {}", self.staging_dir, e);
            return None;
        }

        let removed = purge_staging(&self.staging_dir).await;
        debug!(%request_id, "Purged {} files from staging", removed);

        let request = AcquisitionRequest {
            track_id: track_id.clone(),
            url: self.track_url(track_id),
            staging_dir: self.staging_dir.clone(),
        };

        if let Err(e) = self.acquirer.acquire(&request).await {
            if e.may_have_output() {
                warn!(%request_id, "{} reported failure, checking staging anyway: {}", self.acquirer.name(), e);
            } else {
                warn!(%request_id, "{} failed: {}", self.acquirer.name(), e);
                return None;
            }
        }

        let path = poll_until(self.poll_policy, || {
            find_artifact(&self.staging_dir, &self.accepted_extensions)
        })
        .await?;

        let size_bytes = tokio::fs::metadata(&path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        Some(DownloadArtifact {
            track_id: track_id.clone(),
            path,
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AcquirerBehavior, MockAcquirer};
    use std::time::Duration;
    use tempfile::TempDir;

    fn orchestrator(staging: &std::path::Path, acquirer: &MockAcquirer) -> DownloadOrchestrator {
        let config = DownloaderConfig::default()
            .with_staging_dir(staging.to_path_buf())
            .with_poll(40, 1000);
        DownloadOrchestrator::new(&config, Arc::new(acquirer.clone()))
    }

    #[tokio::test]
    async fn test_invalid_ids_never_reach_acquirer() {
        let dir = TempDir::new().unwrap();
        let acquirer = MockAcquirer::new();
        let orch = orchestrator(dir.path(), &acquirer);

        for raw in ["", "abc", "12;reboot", "$(id)", "1 2", "-1"] {
            assert!(orch.download(raw).await.is_none());
        }
        assert_eq!(acquirer.request_count().await, 0);
    }

    #[tokio::test]
    async fn test_success_returns_artifact() {
        let dir = TempDir::new().unwrap();
        let acquirer = MockAcquirer::new();
        acquirer
            .set_behavior(AcquirerBehavior::WriteFile("12345.mp3".to_string()))
            .await;
        let orch = orchestrator(dir.path(), &acquirer);

        let artifact = orch.download("12345").await.unwrap();
        assert_eq!(artifact.path, dir.path().join("12345.mp3"));
        assert_eq!(artifact.track_id.as_str(), "12345");
        assert_eq!(artifact.file_name(), "12345.mp3");

        let requests = acquirer.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].request.url, "https://www.deezer.com/track/12345");
        assert_eq!(requests[0].request.staging_dir, dir.path());
    }

    #[tokio::test]
    async fn test_staging_purged_before_launch() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("previous.mp3"), b"old").unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("older.flac"), b"old").unwrap();

        let acquirer = MockAcquirer::new();
        acquirer
            .set_behavior(AcquirerBehavior::WriteFile("new.mp3".to_string()))
            .await;
        let orch = orchestrator(dir.path(), &acquirer);

        let artifact = orch.download("7").await.unwrap();

        let requests = acquirer.recorded_requests().await;
        assert_eq!(requests[0].media_files_at_launch, 0);
        assert_eq!(artifact.path, dir.path().join("new.mp3"));
        assert!(!dir.path().join("previous.mp3").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_artifact_appearing_late_is_found() {
        let dir = TempDir::new().unwrap();
        let acquirer = MockAcquirer::new();
        acquirer
            .set_behavior(AcquirerBehavior::WriteFileAfter(
                "late.flac".to_string(),
                Duration::from_millis(5500),
            ))
            .await;
        let orch = orchestrator(dir.path(), &acquirer);

        let artifact = orch.download("99").await.unwrap();
        assert_eq!(artifact.path, dir.path().join("late.flac"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_written_gives_none() {
        let dir = TempDir::new().unwrap();
        let acquirer = MockAcquirer::new();
        let orch = orchestrator(dir.path(), &acquirer);

        assert!(orch.download("12345").await.is_none());
        assert_eq!(acquirer.request_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nonzero_exit_still_checks_staging() {
        let dir = TempDir::new().unwrap();
        let acquirer = MockAcquirer::new();
        acquirer
            .set_behavior(AcquirerBehavior::WriteFileThenFail(
                "partial-ok.mp3".to_string(),
                DownloadError::ExitStatus { code: Some(1) },
            ))
            .await;
        let orch = orchestrator(dir.path(), &acquirer);

        assert!(orch.download("5").await.is_some());
    }

    #[tokio::test]
    async fn test_hard_failure_skips_poll() {
        let dir = TempDir::new().unwrap();
        let acquirer = MockAcquirer::new();
        acquirer
            .set_behavior(AcquirerBehavior::Fail(DownloadError::Timeout {
                timeout_secs: 90,
            }))
            .await;
        let orch = orchestrator(dir.path(), &acquirer);

        // A 40 x 1s poll would make this test take 39s of real time.
        let started = Instant::now();
        assert!(orch.download("5").await.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_creates_missing_staging_dir() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join("fresh");
        let acquirer = MockAcquirer::new();
        acquirer
            .set_behavior(AcquirerBehavior::WriteFile("a.mp3".to_string()))
            .await;
        let orch = orchestrator(&staging, &acquirer);

        assert!(orch.download("1").await.is_some());
        assert!(staging.is_dir());
    }
}
