pub mod catalog;
pub mod config;
pub mod conversation;
pub mod downloader;
pub mod gateway;
pub mod metrics;
pub mod runner;
pub mod testing;

pub use catalog::{
    fetch_track_info, search_catalog, Catalog, CatalogError, DeezerClient, DeezerConfig,
    SearchMode, SearchResult, TrackId, TrackInfo,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use conversation::{ConversationHandler, ConversationState, SessionStore};
pub use downloader::{
    write_tool_config, Acquirer, DeemixAcquirer, DownloadArtifact, DownloadError,
    DownloadOrchestrator, DownloaderConfig,
};
pub use gateway::{ChatGateway, ChatId, GatewayError, TelegramConfig, TelegramGateway};
pub use runner::BotRunner;
