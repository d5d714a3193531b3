//! Trait definitions for the downloader module.

use async_trait::async_trait;
use std::path::PathBuf;

use super::error::DownloadError;
use crate::catalog::TrackId;

/// One run of the acquisition tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionRequest {
    pub track_id: TrackId,
    /// Catalog URL of the track.
    pub url: String,
    /// Directory the tool must write into.
    pub staging_dir: PathBuf,
}

/// Something that materializes a track as a file in a staging directory.
///
/// Completion is observed only through the filesystem; `Ok` means the tool
/// ran to the end, not that a file exists.
#[async_trait]
pub trait Acquirer: Send + Sync {
    /// Returns the name of this acquirer implementation.
    fn name(&self) -> &str;

    /// Run the tool for one track.
    async fn acquire(&self, request: &AcquisitionRequest) -> Result<(), DownloadError>;
}
