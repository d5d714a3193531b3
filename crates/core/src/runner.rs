//! Long-polling loop feeding updates to the conversation handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::conversation::ConversationHandler;
use crate::gateway::ChatGateway;

/// Drives the bot: poll, handle each update in order, repeat.
///
/// Updates are handled one at a time, which keeps downloads from sharing
/// the staging directory concurrently.
pub struct BotRunner {
    gateway: Arc<dyn ChatGateway>,
    handler: Arc<ConversationHandler>,
    error_backoff: Duration,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BotRunner {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        handler: Arc<ConversationHandler>,
        error_backoff: Duration,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            gateway,
            handler,
            error_backoff,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the polling loop in the background.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Bot runner already running");
            return;
        }

        info!("Starting bot runner");
        let handle = self.spawn_poll_loop();
        *self.task.lock().await = Some(handle);
    }

    /// Signal shutdown and wait for the in-flight update to finish.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Bot runner not running");
            return;
        }

        info!("Stopping bot runner");
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.task.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("Polling loop ended abnormally: {}", e);
            }
        }
        info!("Bot runner stopped");
    }

    fn spawn_poll_loop(&self) -> JoinHandle<()> {
        let gateway = Arc::clone(&self.gateway);
        let handler = Arc::clone(&self.handler);
        let running = Arc::clone(&self.running);
        let backoff = self.error_backoff;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Polling loop started");
            let mut offset: Option<i64> = None;

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Polling loop received shutdown signal");
                        break;
                    }
                    result = gateway.poll_updates(offset) => {
                        match result {
                            Ok(batch) => {
                                if let Some(next) = batch.next_offset {
                                    offset = Some(next);
                                }
                                for update in batch.updates {
                                    handler.handle(update).await;
                                }
                                handler.sessions().prune_idle();
                            }
                            Err(e) => {
                                warn!("Polling failed, retrying in {:?}: {}", backoff, e);
                                tokio::select! {
                                    _ = shutdown_rx.recv() => {
                                        info!("Polling loop received shutdown signal");
                                        break;
                                    }
                                    _ = tokio::time::sleep(backoff) => {}
                                }
                            }
                        }
                    }
                }

                if !running.load(Ordering::Relaxed) {
                    debug!("Runner flagged as stopped");
                    break;
                }
            }
            info!("Polling loop stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SearchMode;
    use crate::conversation::{ConversationState, SessionStore};
    use crate::downloader::{DownloadOrchestrator, DownloaderConfig};
    use crate::gateway::{ChatId, GatewayError};
    use crate::testing::{fixtures, MockAcquirer, MockCatalog, MockGateway};
    use tempfile::TempDir;

    fn runner(gateway: &MockGateway, staging: &TempDir) -> (BotRunner, Arc<ConversationHandler>) {
        let config = DownloaderConfig::default().with_staging_dir(staging.path().to_path_buf());
        let handler = Arc::new(ConversationHandler::new(
            SessionStore::new(Duration::from_secs(3600)),
            Arc::new(MockCatalog::new()),
            Arc::new(DownloadOrchestrator::new(
                &config,
                Arc::new(MockAcquirer::new()),
            )),
            Arc::new(gateway.clone()),
            10,
        ));
        let runner = BotRunner::new(
            Arc::new(gateway.clone()),
            Arc::clone(&handler),
            Duration::from_secs(5),
        );
        (runner, handler)
    }

    async fn wait_for_polls(gateway: &MockGateway, count: usize) {
        for _ in 0..1000 {
            if gateway.polled_offsets().await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Gateway was polled fewer than {} times", count);
    }

    #[tokio::test]
    async fn test_updates_handled_in_order_and_offset_advances() {
        let staging = TempDir::new().unwrap();
        let gateway = MockGateway::new();
        gateway
            .push_updates(vec![
                fixtures::command(1, "start"),
                fixtures::callback(1, "search:album"),
            ])
            .await;
        let (runner, handler) = runner(&gateway, &staging);

        runner.start().await;
        assert!(runner.is_running());
        wait_for_polls(&gateway, 2).await;
        runner.stop().await;
        assert!(!runner.is_running());

        assert_eq!(
            handler.state(ChatId(1)),
            ConversationState::AwaitingQuery(SearchMode::Album)
        );
        let offsets = gateway.polled_offsets().await;
        assert_eq!(offsets[0], None);
        assert_eq!(offsets[1], Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_backs_off() {
        let staging = TempDir::new().unwrap();
        let gateway = MockGateway::new();
        gateway
            .set_next_poll_error(GatewayError::Malformed("bad gateway".to_string()))
            .await;
        let (runner, _handler) = runner(&gateway, &staging);

        let started = tokio::time::Instant::now();
        runner.start().await;
        wait_for_polls(&gateway, 2).await;
        runner.stop().await;

        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let staging = TempDir::new().unwrap();
        let gateway = MockGateway::new();
        let (runner, _handler) = runner(&gateway, &staging);

        runner.stop().await;
        assert!(!runner.is_running());
        assert!(gateway.polled_offsets().await.is_empty());
    }
}
