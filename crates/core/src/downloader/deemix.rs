//! deemix-based acquirer implementation.

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use super::config::{Bitrate, DownloaderConfig};
use super::error::DownloadError;
use super::traits::{AcquisitionRequest, Acquirer};

/// File name of the persisted credential inside the tool's config dir.
pub const ARL_FILE_NAME: &str = ".arl";

/// File name of the tool's settings inside its config dir.
pub const SETTINGS_FILE_NAME: &str = "config.json";

/// Runs the `deemix` CLI for each request.
///
/// The credential is written to the child's stdin, never passed as an
/// argument or environment variable.
pub struct DeemixAcquirer {
    binary_path: PathBuf,
    arl: String,
    bitrate: Bitrate,
    timeout: Duration,
}

impl DeemixAcquirer {
    /// Creates an acquirer from the downloader configuration.
    pub fn new(config: &DownloaderConfig) -> Self {
        Self {
            binary_path: config.binary_path.clone(),
            arl: config.arl.clone(),
            bitrate: config.bitrate,
            timeout: Duration::from_secs(config.process_timeout_secs),
        }
    }

    /// Builds the tool arguments for a request.
    fn build_args(&self, request: &AcquisitionRequest) -> Vec<String> {
        vec![
            "-p".to_string(),
            request.staging_dir.to_string_lossy().to_string(),
            "-b".to_string(),
            self.bitrate.cli_value().to_string(),
            request.url.clone(),
        ]
    }
}

#[async_trait]
impl Acquirer for DeemixAcquirer {
    fn name(&self) -> &str {
        "deemix"
    }

    async fn acquire(&self, request: &AcquisitionRequest) -> Result<(), DownloadError> {
        let args = self.build_args(request);
        debug!("Running {:?} for track {}", self.binary_path, request.track_id);

        let mut child = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DownloadError::ToolNotFound {
                        path: self.binary_path.clone(),
                    }
                } else {
                    DownloadError::Io(e)
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // The tool only reads stdin when it has no stored credential; a
            // closed pipe here is not an error.
            if let Err(e) = stdin.write_all(format!("{}\n", self.arl).as_bytes()).await {
                debug!("Credential not consumed by tool: {}", e);
            }
        }

        match timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(DownloadError::ExitStatus {
                code: status.code(),
            }),
            Ok(Err(e)) => Err(DownloadError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                Err(DownloadError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

/// Persist the tool's credential and settings into its config directory.
///
/// Called once at startup. The credential file is only readable by the
/// owner on unix.
pub async fn write_tool_config(config: &DownloaderConfig) -> Result<(), DownloadError> {
    let dir = &config.config_dir;
    tokio::fs::create_dir_all(dir).await?;

    let arl_path = dir.join(ARL_FILE_NAME);
    tokio::fs::write(&arl_path, config.arl.as_bytes()).await?;
    restrict_permissions(&arl_path).await?;

    let settings = json!({
        "downloadLocation": config.staging_dir.to_string_lossy(),
        "tracknameTemplate": "%artist% - %title%",
        "createArtistFolder": false,
        "createAlbumFolder": false,
        "createSingleFolder": false,
        "createPlaylistFolder": false,
        "maxBitrate": config.bitrate.settings_value(),
        "fallbackBitrate": true,
        "overwriteFile": "y",
        "saveArtwork": false,
    });
    let body = serde_json::to_vec_pretty(&settings)
        .map_err(|e| DownloadError::Io(std::io::Error::other(e)))?;
    tokio::fs::write(dir.join(SETTINGS_FILE_NAME), body).await?;

    info!("Acquisition tool configuration written to {:?}", dir);
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), DownloadError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), DownloadError> {
    Ok(())
}
