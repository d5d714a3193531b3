//! Mock acquisition tool for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::downloader::{
    collect_files, AcquisitionRequest, Acquirer, DownloadError,
};

/// What the mock does when asked to acquire a track.
#[derive(Debug)]
pub enum AcquirerBehavior {
    /// Exit cleanly without writing anything.
    WriteNothing,
    /// Write this file name into the staging dir, then exit cleanly.
    WriteFile(String),
    /// Exit cleanly at once, write the file after a delay.
    WriteFileAfter(String, Duration),
    /// Write the file, then report this error.
    WriteFileThenFail(String, DownloadError),
    /// Report this error without writing.
    Fail(DownloadError),
}

/// A recorded acquisition for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedAcquisition {
    /// The request that was made.
    pub request: AcquisitionRequest,
    /// Files present in the staging dir when the tool started.
    pub media_files_at_launch: usize,
}

/// Mock implementation of the Acquirer trait.
///
/// Clones share state, so a test can keep one handle while the
/// orchestrator owns another.
#[derive(Debug, Clone)]
pub struct MockAcquirer {
    behavior: Arc<RwLock<AcquirerBehavior>>,
    requests: Arc<RwLock<Vec<RecordedAcquisition>>>,
}

impl Default for MockAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAcquirer {
    /// Create a mock that exits cleanly and writes nothing.
    pub fn new() -> Self {
        Self {
            behavior: Arc::new(RwLock::new(AcquirerBehavior::WriteNothing)),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Change what subsequent calls do.
    pub async fn set_behavior(&self, behavior: AcquirerBehavior) {
        *self.behavior.write().await = behavior;
    }

    /// Get all recorded acquisitions.
    pub async fn recorded_requests(&self) -> Vec<RecordedAcquisition> {
        self.requests.read().await.clone()
    }

    /// Number of acquisitions attempted.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

async fn write_file(dir: &Path, name: &str) -> Result<(), DownloadError> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(name), b"fake audio").await?;
    Ok(())
}

/// `DownloadError` holds an `io::Error`, so it cannot derive `Clone`.
fn replay(error: &DownloadError) -> DownloadError {
    match error {
        DownloadError::InvalidTrackId(e) => DownloadError::InvalidTrackId(e.clone()),
        DownloadError::ToolNotFound { path } => DownloadError::ToolNotFound { path: path.clone() },
        DownloadError::ExitStatus { code } => DownloadError::ExitStatus { code: *code },
        DownloadError::Timeout { timeout_secs } => DownloadError::Timeout {
            timeout_secs: *timeout_secs,
        },
        DownloadError::Io(e) => DownloadError::Io(std::io::Error::new(e.kind(), e.to_string())),
    }
}

#[async_trait]
impl Acquirer for MockAcquirer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn acquire(&self, request: &AcquisitionRequest) -> Result<(), DownloadError> {
        let media_files_at_launch = collect_files(&request.staging_dir).await.len();
        self.requests.write().await.push(RecordedAcquisition {
            request: request.clone(),
            media_files_at_launch,
        });

        let behavior = self.behavior.read().await;
        match &*behavior {
            AcquirerBehavior::WriteNothing => Ok(()),
            AcquirerBehavior::WriteFile(name) => write_file(&request.staging_dir, name).await,
            AcquirerBehavior::WriteFileAfter(name, delay) => {
                let dir = request.staging_dir.clone();
                let name = name.clone();
                let delay = *delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = write_file(&dir, &name).await;
                });
                Ok(())
            }
            AcquirerBehavior::WriteFileThenFail(name, error) => {
                write_file(&request.staging_dir, name).await?;
                Err(replay(error))
            }
            AcquirerBehavior::Fail(error) => Err(replay(error)),
        }
    }
}
