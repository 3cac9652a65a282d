use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::gateway::{GatewayError, MicrophoneInfo, VoiceGateway};
use crate::notice::NoticeFeed;

/// Speech-recognition locales the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "en-GB")]
    EnGb,
    #[serde(rename = "es-ES")]
    EsEs,
    #[serde(rename = "fr-FR")]
    FrFr,
    #[serde(rename = "de-DE")]
    DeDe,
}

impl Default for Language {
    fn default() -> Self {
        Language::EnUs
    }
}

/// User configuration held authoritatively by the service. The client works
/// on a local copy; field defaults mirror the service's own defaults so a
/// partial reply still yields a usable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDocument {
    pub wake_word: String,
    pub language: Language,
    pub voice_feedback: bool,
    pub run_in_background: bool,
    pub auto_start_listening: bool,
    pub microphone_sensitivity: u8,
    pub selected_microphone: String,
    pub command_feedback: bool,
    pub voice_confirmation: bool,
    pub dark_mode: bool,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            wake_word: "hey pc".to_string(),
            language: Language::EnUs,
            voice_feedback: true,
            run_in_background: true,
            auto_start_listening: false,
            microphone_sensitivity: 75,
            selected_microphone: "default".to_string(),
            command_feedback: true,
            voice_confirmation: true,
            dark_mode: true,
        }
    }
}

/// What presentation layers observe: the working copy, whether it has unsaved
/// edits, and the input devices available for the microphone picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub document: SettingsDocument,
    pub dirty: bool,
    pub microphones: Vec<MicrophoneInfo>,
}

impl Default for SettingsView {
    fn default() -> Self {
        Self {
            document: SettingsDocument::default(),
            dirty: false,
            microphones: Vec::new(),
        }
    }
}

/// Fetch-merge-save cycle for the settings document.
///
/// The working copy is clean after a load and after a confirmed save; every
/// local edit marks it dirty without touching the service. A save publishes
/// the entire document, so it overwrites any concurrent remote edits. That
/// is a documented limitation of the full-document protocol.
#[derive(Clone)]
pub struct SettingsController {
    gateway: Arc<dyn VoiceGateway>,
    view_tx: Arc<watch::Sender<SettingsView>>,
    notices: NoticeFeed,
}

impl SettingsController {
    pub fn new(gateway: Arc<dyn VoiceGateway>, notices: NoticeFeed) -> Self {
        let (view_tx, _) = watch::channel(SettingsView::default());
        Self {
            gateway,
            view_tx: Arc::new(view_tx),
            notices,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SettingsView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> SettingsView {
        self.view_tx.borrow().clone()
    }

    /// Replaces the working copy wholesale with the service's document and
    /// marks it clean. The microphone list is refreshed best-effort; a failed
    /// listing keeps whatever was known before.
    pub async fn load(&self) -> Result<(), GatewayError> {
        let document = match self.gateway.settings().await {
            Ok(document) => document,
            Err(err) => {
                warn!("settings load failed: {err}");
                self.notices.error(format!("Could not load settings: {err}"));
                return Err(err);
            }
        };

        let microphones = match self.gateway.microphones().await {
            Ok(microphones) => microphones,
            Err(err) => {
                debug!("microphone listing failed: {err}");
                self.view_tx.borrow().microphones.clone()
            }
        };

        self.view_tx.send_replace(SettingsView {
            document,
            dirty: false,
            microphones,
        });
        Ok(())
    }

    /// Applies a local edit and marks the document dirty. Never contacts the
    /// service. Sensitivity is clamped to the 0–100 scale the service expects.
    pub fn edit(&self, apply: impl FnOnce(&mut SettingsDocument)) {
        self.view_tx.send_modify(|view| {
            apply(&mut view.document);
            view.document.microphone_sensitivity = view.document.microphone_sensitivity.min(100);
            view.dirty = true;
        });
    }

    /// Publishes the entire current document. Success marks the copy clean
    /// unless it was edited again while the save was in flight; failure keeps
    /// the dirty copy and every local edit intact for an explicit retry.
    pub async fn save(&self) -> Result<(), GatewayError> {
        let snapshot = self.view_tx.borrow().document.clone();
        match self.gateway.update_settings(&snapshot).await {
            Ok(()) => {
                self.view_tx.send_modify(|view| {
                    if view.document == snapshot {
                        view.dirty = false;
                    }
                });
                info!("settings saved");
                Ok(())
            }
            Err(err) => {
                warn!("settings save failed: {err}");
                self.notices.error(format!("Could not save settings: {err}"));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::Notice;
    use crate::test_support::MockGateway;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn controller_with(gateway: Arc<MockGateway>) -> (SettingsController, UnboundedReceiver<Notice>) {
        let (notices, notice_rx) = NoticeFeed::channel();
        (SettingsController::new(gateway, notices), notice_rx)
    }

    #[test]
    fn defaults_mirror_the_service() {
        let document = SettingsDocument::default();
        assert_eq!(document.wake_word, "hey pc");
        assert_eq!(document.language, Language::EnUs);
        assert_eq!(document.microphone_sensitivity, 75);
        assert_eq!(document.selected_microphone, "default");
        assert!(!document.auto_start_listening);
    }

    #[test]
    fn document_decodes_with_missing_fields() {
        let document: SettingsDocument =
            serde_json::from_str(r#"{"wake_word": "computer", "language": "de-DE"}"#)
                .expect("partial document");
        assert_eq!(document.wake_word, "computer");
        assert_eq!(document.language, Language::DeDe);
        assert!(document.voice_feedback);
    }

    #[tokio::test]
    async fn load_replaces_the_working_copy_and_marks_clean() {
        let gateway = Arc::new(MockGateway::default());
        gateway.script_settings(Ok(SettingsDocument {
            wake_word: "phoenix".to_string(),
            ..SettingsDocument::default()
        }));
        gateway.script_microphones(Ok(vec![MicrophoneInfo {
            id: 0,
            name: "Built-in".to_string(),
        }]));
        let (controller, _notices) = controller_with(gateway);

        controller.edit(|document| document.wake_word = "scratch".to_string());
        controller.load().await.expect("load");

        let view = controller.view();
        assert_eq!(view.document.wake_word, "phoenix");
        assert!(!view.dirty);
        assert_eq!(view.microphones.len(), 1);
    }

    #[tokio::test]
    async fn edit_marks_dirty_without_gateway_traffic() {
        let gateway = Arc::new(MockGateway::default());
        let (controller, _notices) = controller_with(Arc::clone(&gateway));

        controller.edit(|document| document.microphone_sensitivity = 90);

        let view = controller.view();
        assert!(view.dirty);
        assert_eq!(view.document.microphone_sensitivity, 90);
        assert_eq!(gateway.update_settings_calls(), 0);
    }

    #[tokio::test]
    async fn edit_clamps_sensitivity_to_scale() {
        let gateway = Arc::new(MockGateway::default());
        let (controller, _notices) = controller_with(gateway);

        controller.edit(|document| document.microphone_sensitivity = 255);

        assert_eq!(controller.view().document.microphone_sensitivity, 100);
    }

    #[tokio::test]
    async fn failed_save_keeps_edits_and_dirty_flag() {
        let gateway = Arc::new(MockGateway::default());
        gateway.script_update_settings(Err(GatewayError::Unreachable(
            "connection refused".to_string(),
        )));
        let (controller, mut notices) = controller_with(Arc::clone(&gateway));

        controller.edit(|document| document.wake_word = "jarvis".to_string());
        let result = controller.save().await;
        assert!(result.is_err());

        let view = controller.view();
        assert!(view.dirty);
        assert_eq!(view.document.wake_word, "jarvis");
        assert!(notices.try_recv().is_ok());

        // Next save succeeds (mock default) and clears the flag.
        controller.save().await.expect("retry save");
        assert!(!controller.view().dirty);
        assert_eq!(gateway.update_settings_calls(), 2);
    }
}
