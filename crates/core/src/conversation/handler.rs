//! Per-update conversation driver.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::callback::CallbackAction;
use super::delivery::deliver_artifact;
use super::menu;
use super::session::SessionStore;
use super::state::{ConversationState, Input};
use crate::catalog::{search_catalog, Catalog, SearchMode, SearchResult};
use crate::downloader::DownloadOrchestrator;
use crate::gateway::{ChatGateway, ChatId, IncomingUpdate, OutgoingMessage, UpdateKind};
use crate::metrics;

/// Applies updates to the per-chat state machine.
///
/// Every turn ends in a defined state; errors are logged or shown to the
/// user and never escape `handle`.
pub struct ConversationHandler {
    sessions: SessionStore,
    catalog: Arc<dyn Catalog>,
    downloader: Arc<DownloadOrchestrator>,
    gateway: Arc<dyn ChatGateway>,
    result_limit: u32,
}

impl ConversationHandler {
    pub fn new(
        sessions: SessionStore,
        catalog: Arc<dyn Catalog>,
        downloader: Arc<DownloadOrchestrator>,
        gateway: Arc<dyn ChatGateway>,
        result_limit: u32,
    ) -> Self {
        Self {
            sessions,
            catalog,
            downloader,
            gateway,
            result_limit,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Current state of a chat.
    pub fn state(&self, chat_id: ChatId) -> ConversationState {
        self.sessions
            .get(chat_id)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    /// Process one update to completion.
    pub async fn handle(&self, update: IncomingUpdate) {
        let chat_id = update.chat_id;
        metrics::UPDATES_TOTAL
            .with_label_values(&[update.kind.label()])
            .inc();

        if let UpdateKind::Callback { id, .. } = &update.kind {
            if let Err(e) = self.gateway.answer_callback(id).await {
                debug!("Failed to answer callback {}: {}", id, e);
            }
        }

        let Some(input) = Input::from_update(&update.kind) else {
            debug!("Ignoring update {} from chat {}", update.update_id, chat_id);
            return;
        };

        match input {
            Input::Start => self.show_menu(chat_id, menu::MENU_PROMPT).await,
            Input::Text(text) => self.on_text(chat_id, &text).await,
            Input::Callback(CallbackAction::Search(mode)) => self.await_query(chat_id, mode).await,
            Input::Callback(CallbackAction::Back) => {
                self.show_menu(chat_id, menu::MENU_PROMPT).await
            }
            Input::Callback(CallbackAction::Track(raw_id)) => self.deliver(chat_id, &raw_id).await,
        }
    }

    async fn show_menu(&self, chat_id: ChatId, prompt: &str) {
        self.sessions.set_state(chat_id, ConversationState::Menu);
        self.send(
            chat_id,
            OutgoingMessage::text(prompt).with_keyboard(menu::main_menu()),
        )
        .await;
    }

    async fn await_query(&self, chat_id: ChatId, mode: SearchMode) {
        self.sessions
            .set_state(chat_id, ConversationState::AwaitingQuery(mode));
        self.send(chat_id, OutgoingMessage::text(menu::query_prompt(mode)))
            .await;
    }

    async fn on_text(&self, chat_id: ChatId, text: &str) {
        let Some(mode) = self.sessions.state(chat_id).search_mode() else {
            self.show_menu(chat_id, menu::PICK_MODE_FIRST).await;
            return;
        };

        let results = search_catalog(self.catalog.as_ref(), mode, text, self.result_limit).await;
        if results.is_empty() {
            self.show_menu(chat_id, menu::NO_RESULTS).await;
            return;
        }

        info!(
            "Chat {}: {} results for {} search",
            chat_id,
            results.len(),
            mode
        );
        self.sessions
            .set_state(chat_id, ConversationState::ShowingResults(mode));
        self.send_results(chat_id, text.trim(), &results).await;
    }

    /// Send the result list, falling back to plain text if the Markdown
    /// version is rejected. A chat that gets no list goes back to `Menu`.
    async fn send_results(&self, chat_id: ChatId, query: &str, results: &[SearchResult]) {
        let keyboard = menu::results_keyboard(results);
        let formatted =
            OutgoingMessage::markdown(menu::results_header(query)).with_keyboard(keyboard.clone());

        let Err(e) = self.gateway.send_message(chat_id, formatted).await else {
            return;
        };
        warn!(
            "Chat {}: formatted result list rejected, resending as plain text: {}",
            chat_id, e
        );

        let plain = OutgoingMessage::text(menu::plain_results_header(query)).with_keyboard(keyboard);
        if let Err(e) = self.gateway.send_message(chat_id, plain).await {
            warn!("Chat {}: result list not delivered: {}", chat_id, e);
            self.sessions.set_state(chat_id, ConversationState::Menu);
        }
    }

    async fn deliver(&self, chat_id: ChatId, raw_id: &str) {
        self.sessions
            .set_state(chat_id, ConversationState::Delivering);
        self.send(chat_id, OutgoingMessage::text(menu::DOWNLOADING))
            .await;

        let artifact = self.downloader.download(raw_id).await;
        let outcome = deliver_artifact(
            self.gateway.as_ref(),
            self.catalog.as_ref(),
            chat_id,
            artifact.as_ref(),
        )
        .await;

        self.show_menu(chat_id, outcome.menu_prompt()).await;
    }

    async fn send(&self, chat_id: ChatId, message: OutgoingMessage) {
        if let Err(e) = self.gateway.send_message(chat_id, message).await {
            warn!("Failed to send message to chat {}: {}", chat_id, e);
        }
    }
}
