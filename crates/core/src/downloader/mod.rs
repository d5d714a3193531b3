//! Download orchestration around an external acquisition tool.
//!
//! The flow for one track is:
//! 1. validate the id
//! 2. purge the staging directory
//! 3. run the acquirer (bounded by a timeout)
//! 4. poll the staging directory for a media file
//!
//! Every failure collapses to "no artifact".

mod config;
mod deemix;
mod error;
mod orchestrator;
mod poll;
mod staging;
mod traits;
mod types;

pub use config::{Bitrate, DownloaderConfig};
pub use deemix::{write_tool_config, DeemixAcquirer, ARL_FILE_NAME, SETTINGS_FILE_NAME};
pub use error::DownloadError;
pub use orchestrator::DownloadOrchestrator;
pub use poll::{poll_until, PollPolicy};
pub use staging::{collect_files, find_artifact, has_accepted_extension, purge_staging};
pub use traits::{AcquisitionRequest, Acquirer};
pub use types::DownloadArtifact;
