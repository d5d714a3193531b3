use super::loader::{ARL_ENV, TOKEN_ENV};
use super::{types::Config, ConfigError};

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message.into()))
}

/// Validate configuration
/// Currently validates:
/// - Bot token and catalog credential are present
/// - Poll budgets and timeouts are not 0
/// - At least one artifact extension is accepted
/// - Server port is not 0 when the server is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.telegram.token.trim().is_empty() {
        return invalid(format!("{} is not set", TOKEN_ENV));
    }
    if config.downloader.arl.trim().is_empty() {
        return invalid(format!("{} is not set", ARL_ENV));
    }

    let downloader = &config.downloader;
    if downloader.poll_attempts == 0 {
        return invalid("downloader.poll_attempts cannot be 0");
    }
    if downloader.process_timeout_secs == 0 {
        return invalid("downloader.process_timeout_secs cannot be 0");
    }
    if downloader.accepted_extensions.is_empty() {
        return invalid("downloader.accepted_extensions cannot be empty");
    }
    if config.catalog.timeout_secs == 0 {
        return invalid("catalog.timeout_secs cannot be 0");
    }
    if config.catalog.result_limit == 0 {
        return invalid("catalog.result_limit cannot be 0");
    }
    if config.telegram.request_timeout_secs == 0 {
        return invalid("telegram.request_timeout_secs cannot be 0");
    }

    // Server validation
    if config.server.enabled && config.server.port == 0 {
        return invalid("server.port cannot be 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.telegram.token = "123:abc".to_string();
        config.downloader.arl = "arl".to_string();
        config
    }

    fn validation_message(config: &Config) -> String {
        match validate_config(config) {
            Err(ConfigError::ValidationError(message)) => message,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_token_names_variable() {
        let mut config = valid_config();
        config.telegram.token = "  ".to_string();
        assert!(validation_message(&config).contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_missing_arl_names_variable() {
        let mut config = valid_config();
        config.downloader.arl.clear();
        assert!(validation_message(&config).contains("DEEZER_ARL"));
    }

    #[test]
    fn test_zero_budgets_fail() {
        let mut config = valid_config();
        config.downloader.poll_attempts = 0;
        assert!(validation_message(&config).contains("poll_attempts"));

        let mut config = valid_config();
        config.downloader.process_timeout_secs = 0;
        assert!(validation_message(&config).contains("process_timeout_secs"));
    }

    #[test]
    fn test_empty_extensions_fail() {
        let mut config = valid_config();
        config.downloader.accepted_extensions.clear();
        assert!(validation_message(&config).contains("accepted_extensions"));
    }

    #[test]
    fn test_port_zero_only_matters_when_enabled() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(validate_config(&config).is_ok());

        config.server.enabled = true;
        assert!(validation_message(&config).contains("server.port"));
    }
}
