//! Error types for the downloader module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while acquiring a track.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Track identifier failed validation.
    #[error("Invalid track id: {0}")]
    InvalidTrackId(#[from] crate::catalog::InvalidTrackId),

    /// Acquisition tool binary not found.
    #[error("Acquisition tool not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// Acquisition tool exited unsuccessfully.
    #[error("Acquisition tool exited with code: {code:?}")]
    ExitStatus { code: Option<i32> },

    /// Acquisition tool did not finish in time.
    #[error("Acquisition timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while preparing or running the download.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Whether the staging directory is still worth checking after this error.
    ///
    /// The tool may write the file and still exit non-zero.
    pub fn may_have_output(&self) -> bool {
        matches!(self, Self::ExitStatus { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TrackId;

    #[test]
    fn test_rejected_id_converts_to_invalid_track_id() {
        let error = TrackId::parse("12;rm").map_err(DownloadError::from).unwrap_err();

        assert!(matches!(error, DownloadError::InvalidTrackId(_)));
        assert!(error.to_string().contains("12;rm"));
        assert!(!error.may_have_output());
    }

    #[test]
    fn test_only_exit_status_may_have_output() {
        assert!(DownloadError::ExitStatus { code: Some(1) }.may_have_output());
        assert!(!DownloadError::Timeout { timeout_secs: 90 }.may_have_output());
    }
}
