use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::DeezerConfig;
use crate::downloader::{Bitrate, DownloaderConfig};
use crate::gateway::TelegramConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub catalog: DeezerConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Health and metrics HTTP server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    9090
}

/// Per-chat session retention.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Sessions untouched for this long are forgotten.
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl(),
        }
    }
}

impl SessionConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

fn default_idle_ttl() -> u64 {
    24 * 60 * 60
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub telegram: SanitizedTelegramConfig,
    pub catalog: DeezerConfig,
    pub downloader: SanitizedDownloaderConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
}

/// Sanitized Telegram config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub api_url: String,
    pub token_configured: bool,
    pub poll_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub error_backoff_secs: u64,
}

/// Sanitized downloader config (ARL hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDownloaderConfig {
    pub arl_configured: bool,
    pub binary_path: PathBuf,
    pub staging_dir: PathBuf,
    pub config_dir: PathBuf,
    pub track_url_base: String,
    pub process_timeout_secs: u64,
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
    pub accepted_extensions: Vec<String>,
    pub bitrate: Bitrate,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let telegram = &config.telegram;
        let downloader = &config.downloader;

        Self {
            telegram: SanitizedTelegramConfig {
                api_url: telegram.api_url.clone(),
                token_configured: !telegram.token.is_empty(),
                poll_timeout_secs: telegram.poll_timeout_secs,
                request_timeout_secs: telegram.request_timeout_secs,
                error_backoff_secs: telegram.error_backoff_secs,
            },
            catalog: config.catalog.clone(),
            downloader: SanitizedDownloaderConfig {
                arl_configured: !downloader.arl.is_empty(),
                binary_path: downloader.binary_path.clone(),
                staging_dir: downloader.staging_dir.clone(),
                config_dir: downloader.config_dir.clone(),
                track_url_base: downloader.track_url_base.clone(),
                process_timeout_secs: downloader.process_timeout_secs,
                poll_attempts: downloader.poll_attempts,
                poll_interval_ms: downloader.poll_interval_ms,
                accepted_extensions: downloader.accepted_extensions.clone(),
                bitrate: downloader.bitrate,
            },
            session: config.session.clone(),
            server: config.server.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.catalog.result_limit, 10);
        assert_eq!(config.downloader.poll_attempts, 40);
        assert_eq!(config.session.idle_ttl_secs, 86400);
        assert!(!config.server.enabled);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
    }

    #[test]
    fn test_deserialize_sections() {
        let toml = r#"
[telegram]
poll_timeout_secs = 50

[downloader]
staging_dir = "/srv/staging"
bitrate = "flac"
accepted_extensions = ["flac"]

[server]
enabled = true
host = "127.0.0.1"
port = 9100
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.telegram.poll_timeout_secs, 50);
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.downloader.staging_dir, PathBuf::from("/srv/staging"));
        assert_eq!(config.downloader.bitrate, Bitrate::Flac);
        assert_eq!(config.downloader.accepted_extensions, vec!["flac"]);
        assert!(config.server.enabled);
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let mut config = Config::default();
        config.telegram.token = "123:secret-token".to_string();
        config.downloader.arl = "secret-arl".to_string();

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.telegram.token_configured);
        assert!(sanitized.downloader.arl_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-token"));
        assert!(!json.contains("secret-arl"));
    }
}
