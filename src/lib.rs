//! Client-side synchronization core for the VoiceLink PC voice-control
//! service.
//!
//! The service on the controlled machine is the source of truth; this crate
//! keeps a local view of it eventually consistent and exposes typed intents
//! for presentation layers. Controllers are constructed once at the
//! [`VoiceLink`] composition root; screens observe their watch channels and
//! never reach into each other's state.

pub mod catalog;
pub mod dispatch;
pub mod gateway;
pub mod notice;
pub mod session;
pub mod settings;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};

pub use catalog::{CatalogView, CategoryMatches, CommandCatalog, CommandCategory, ALL_CATEGORIES};
pub use dispatch::{CommandDispatcher, CommandExecution, ExecutionStatus};
pub use gateway::{
    CommandLogEntry, ConfigError, ExecuteOutcome, GatewayConfig, GatewayError, HttpGateway,
    MicrophoneInfo, StatusReport, VoiceGateway,
};
pub use notice::{Notice, NoticeFeed, NoticeKind};
pub use session::{ListeningSessionController, SessionState, TransitionDirection};
pub use settings::{Language, SettingsController, SettingsDocument, SettingsView};
pub use sync::{DeviceTelemetry, StatusSyncController};

/// Client-side failure taxonomy on top of [`GatewayError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A conflicting operation is already in flight; nothing was sent.
    #[error("another start/stop request is still in flight")]
    Busy,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Composition root: one instance of every controller, built over a shared
/// gateway. The returned receiver is the single consumer of user-visible
/// notices.
pub struct VoiceLink {
    catalog: CommandCatalog,
    session: ListeningSessionController,
    dispatcher: CommandDispatcher,
    settings: SettingsController,
    sync: StatusSyncController,
    search_tx: Arc<watch::Sender<CatalogView>>,
}

impl VoiceLink {
    pub fn new(gateway: Arc<dyn VoiceGateway>) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (notices, notice_rx) = NoticeFeed::channel();
        let catalog = CommandCatalog::builtin();
        let session = ListeningSessionController::new(Arc::clone(&gateway), notices.clone());
        let dispatcher = CommandDispatcher::new(Arc::clone(&gateway), notices.clone());
        let settings = SettingsController::new(Arc::clone(&gateway), notices.clone());
        let sync = StatusSyncController::new(gateway, session.clone(), notices);
        let (search_tx, _) = watch::channel(CatalogView::from_query(&catalog, "", ALL_CATEGORIES));

        let client = Self {
            catalog,
            session,
            dispatcher,
            settings,
            sync,
            search_tx: Arc::new(search_tx),
        };
        (client, notice_rx)
    }

    /// Builds the production HTTP gateway from `config` and wires everything
    /// up.
    pub fn connect(
        config: GatewayConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notice>), ConfigError> {
        let gateway = Arc::new(HttpGateway::new(config)?);
        Ok(Self::new(gateway))
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    pub fn session(&self) -> &ListeningSessionController {
        &self.session
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn settings(&self) -> &SettingsController {
        &self.settings
    }

    pub fn sync(&self) -> &StatusSyncController {
        &self.sync
    }

    // Imperative intents, one per screen action.

    pub async fn toggle_listening(&self) -> Result<SessionState, ClientError> {
        self.session.toggle().await
    }

    pub async fn dispatch(&self, command: &str) -> Result<(), GatewayError> {
        self.dispatcher.dispatch(command).await
    }

    pub fn edit_settings(&self, apply: impl FnOnce(&mut SettingsDocument)) {
        self.settings.edit(apply);
    }

    pub async fn save_settings(&self) -> Result<(), GatewayError> {
        self.settings.save().await
    }

    pub async fn load_settings(&self) -> Result<(), GatewayError> {
        self.settings.load().await
    }

    pub async fn start_sync(&self) {
        self.sync.start().await;
    }

    pub async fn stop_sync(&self) {
        self.sync.stop().await;
    }

    /// Re-evaluates the command browser's filter and publishes the view.
    pub fn set_search(&self, query: &str, category_id: &str) {
        self.search_tx
            .send_replace(CatalogView::from_query(&self.catalog, query, category_id));
    }

    pub fn search_results(&self) -> watch::Receiver<CatalogView> {
        self.search_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockGateway;

    #[tokio::test]
    async fn set_search_publishes_a_filtered_view() {
        let (client, _notices) = VoiceLink::new(Arc::new(MockGateway::default()));
        let mut results = client.search_results();

        assert_eq!(
            results.borrow_and_update().categories.len(),
            client.catalog().categories().len()
        );

        client.set_search("shutdown", ALL_CATEGORIES);
        let view = results.borrow_and_update().clone();
        assert_eq!(view.query, "shutdown");
        assert_eq!(view.categories.len(), 1);
        assert_eq!(view.categories[0].label, "System Control");
    }

    #[tokio::test]
    async fn intents_reach_their_controllers() {
        let gateway = Arc::new(MockGateway::default());
        let (client, _notices) = VoiceLink::new(Arc::clone(&gateway) as Arc<dyn VoiceGateway>);

        client.toggle_listening().await.expect("toggle");
        assert_eq!(client.session().current().await, SessionState::Listening);

        client.dispatch("take a screenshot").await.expect("dispatch");
        assert_eq!(gateway.execute_calls(), 1);

        client.edit_settings(|document| document.dark_mode = false);
        assert!(client.settings().view().dirty);
        client.save_settings().await.expect("save");
        assert!(!client.settings().view().dirty);
    }
}
