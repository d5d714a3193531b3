//! Configuration for the download orchestrator and the acquisition tool.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::poll::PollPolicy;

/// Audio quality requested from the acquisition tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bitrate {
    Mp3_128,
    Mp3_320,
    Flac,
}

impl Bitrate {
    /// Value for the tool's `--bitrate` flag.
    pub fn cli_value(&self) -> &'static str {
        match self {
            Self::Mp3_128 => "128",
            Self::Mp3_320 => "320",
            Self::Flac => "flac",
        }
    }

    /// Value for the tool's `maxBitrate` setting.
    pub fn settings_value(&self) -> &'static str {
        match self {
            Self::Mp3_128 => "1",
            Self::Mp3_320 => "3",
            Self::Flac => "9",
        }
    }
}

/// Configuration for downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Catalog access credential handed to the acquisition tool.
    /// Usually supplied through the `DEEZER_ARL` environment variable.
    #[serde(default)]
    pub arl: String,

    /// Path to the acquisition tool binary.
    #[serde(default = "default_binary_path")]
    pub binary_path: PathBuf,

    /// Directory the tool writes into. Purged before every download.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Directory holding the tool's persisted configuration.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Base of the track URL handed to the tool; the track id is appended.
    #[serde(default = "default_track_url_base")]
    pub track_url_base: String,

    /// Hard limit for a single tool run in seconds.
    #[serde(default = "default_process_timeout")]
    pub process_timeout_secs: u64,

    /// How many times the staging directory is checked for the artifact.
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,

    /// Delay between staging directory checks in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// File extensions accepted as a finished artifact (without dot).
    #[serde(default = "default_extensions")]
    pub accepted_extensions: Vec<String>,

    /// Requested audio quality.
    #[serde(default = "default_bitrate")]
    pub bitrate: Bitrate,
}

fn default_binary_path() -> PathBuf {
    PathBuf::from("deemix")
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("deezer_downloads")
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("deemix")
}

fn default_track_url_base() -> String {
    "https://www.deezer.com/track".to_string()
}

fn default_process_timeout() -> u64 {
    90
}

fn default_poll_attempts() -> u32 {
    40
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_extensions() -> Vec<String> {
    vec!["mp3".to_string(), "flac".to_string()]
}

fn default_bitrate() -> Bitrate {
    Bitrate::Mp3_320
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            arl: String::new(),
            binary_path: default_binary_path(),
            staging_dir: default_staging_dir(),
            config_dir: default_config_dir(),
            track_url_base: default_track_url_base(),
            process_timeout_secs: default_process_timeout(),
            poll_attempts: default_poll_attempts(),
            poll_interval_ms: default_poll_interval(),
            accepted_extensions: default_extensions(),
            bitrate: default_bitrate(),
        }
    }
}

impl DownloaderConfig {
    /// Poll policy derived from the attempt budget and interval.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(self.poll_attempts, self.poll_interval_ms)
    }

    /// Sets the staging directory.
    pub fn with_staging_dir(mut self, staging_dir: PathBuf) -> Self {
        self.staging_dir = staging_dir;
        self
    }

    /// Sets the poll budget.
    pub fn with_poll(mut self, attempts: u32, interval_ms: u64) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval_ms = interval_ms;
        self
    }
}
