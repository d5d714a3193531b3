use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use super::{types::Config, ConfigError};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "TUNEGRAB_CONFIG";

/// Config file used when `TUNEGRAB_CONFIG` is unset; optional.
pub const DEFAULT_CONFIG_FILE: &str = "tunegrab.toml";

/// Prefix for overrides such as `TUNEGRAB_DOWNLOADER__STAGING_DIR`.
pub const ENV_PREFIX: &str = "TUNEGRAB_";

/// Bot token variable.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Catalog credential variable.
pub const ARL_ENV: &str = "DEEZER_ARL";

/// Layered sources: TOML file, then prefixed env, then the raw credential
/// variables. Missing files are skipped.
fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Env::raw().only(&[TOKEN_ENV]).map(|_| "telegram.token".into()))
        .merge(Env::raw().only(&[ARL_ENV]).map(|_| "downloader.arl".into()))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(figment(path))
}

/// Load configuration from the file named by `TUNEGRAB_CONFIG`, or from
/// `tunegrab.toml` when present, with environment overrides.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) => load_config(&PathBuf::from(path)),
        None => extract(figment(Path::new(DEFAULT_CONFIG_FILE))),
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
