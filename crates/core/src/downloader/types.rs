//! Types for the downloader module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::TrackId;

/// A media file produced for a track request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadArtifact {
    pub track_id: TrackId,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl DownloadArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used for the attachment.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.mp3", self.track_id))
    }
}
