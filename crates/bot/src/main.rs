mod http;
mod metrics;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunegrab_core::{
    load_config_from_env, validate_config, write_tool_config, Acquirer, BotRunner, Catalog,
    ChatGateway, Config, ConversationHandler, DeemixAcquirer, DeezerClient,
    DownloadOrchestrator, SanitizedConfig, SessionStore, TelegramGateway,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tunegrab_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = load_config_from_env().context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;

    info!("Configuration loaded successfully");
    if let Ok(json) = serde_json::to_string(&SanitizedConfig::from(&config)) {
        info!("Effective configuration: {}", json);
    }

    // Persist the acquisition tool's credential and settings
    write_tool_config(&config.downloader)
        .await
        .with_context(|| {
            format!(
                "Failed to write acquisition tool config to {:?}",
                config.downloader.config_dir
            )
        })?;

    let runner = build_runner(&config)?;

    // Optional health/metrics server
    let (server_shutdown_tx, _) = broadcast::channel::<()>(1);
    let server_handle = if config.server.enabled {
        let addr = SocketAddr::new(config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        info!("Serving health and metrics on {}", addr);

        let mut shutdown_rx = server_shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            let result = axum::serve(listener, http::create_router())
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await;
            if let Err(e) = result {
                error!("Health server error: {}", e);
            }
        }))
    } else {
        None
    };

    runner.start().await;
    metrics::RUNNER_UP.set(1);
    info!("Bot is running, waiting for updates");

    shutdown_signal().await;
    info!("Shutdown signal received");

    runner.stop().await;
    metrics::RUNNER_UP.set(0);

    let _ = server_shutdown_tx.send(());
    if let Some(handle) = server_handle {
        if let Err(e) = handle.await {
            warn!("Health server task failed: {}", e);
        }
    }

    info!("Bot stopped");
    Ok(())
}

/// Wire catalog, downloader, gateway and conversation handler together.
fn build_runner(config: &Config) -> Result<BotRunner> {
    let catalog: Arc<dyn Catalog> = Arc::new(
        DeezerClient::new(&config.catalog).context("Failed to create catalog client")?,
    );
    info!("Catalog client ready ({})", config.catalog.base_url);

    let acquirer: Arc<dyn Acquirer> = Arc::new(DeemixAcquirer::new(&config.downloader));
    info!(
        "Using acquirer {} at {:?}, staging in {:?}",
        acquirer.name(),
        config.downloader.binary_path,
        config.downloader.staging_dir
    );
    let downloader = Arc::new(DownloadOrchestrator::new(&config.downloader, acquirer));

    let gateway: Arc<dyn ChatGateway> = Arc::new(
        TelegramGateway::new(&config.telegram).context("Failed to create Telegram gateway")?,
    );

    let handler = Arc::new(ConversationHandler::new(
        SessionStore::new(config.session.idle_ttl()),
        catalog,
        downloader,
        Arc::clone(&gateway),
        config.catalog.result_limit,
    ));

    Ok(BotRunner::new(
        gateway,
        handler,
        Duration::from_secs(config.telegram.error_backoff_secs),
    ))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
