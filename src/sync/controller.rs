use std::sync::Arc;

use log::debug;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::gateway::{CommandLogEntry, VoiceGateway};
use crate::notice::NoticeFeed;
use crate::session::ListeningSessionController;

use super::loop_worker::{status_sync_loop, SyncShared};
use super::state::DeviceTelemetry;

struct SyncTask {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Owns the refresh loop's lifetime. Started when the observing view becomes
/// active, stopped when it goes away; stopping cancels the pending tick and
/// any in-flight cycle. The telemetry and command-log channels outlive the
/// loop, so observers keep their receivers across restarts.
#[derive(Clone)]
pub struct StatusSyncController {
    gateway: Arc<dyn VoiceGateway>,
    session: ListeningSessionController,
    notices: NoticeFeed,
    telemetry_tx: Arc<watch::Sender<DeviceTelemetry>>,
    commands_tx: Arc<watch::Sender<Vec<CommandLogEntry>>>,
    task: Arc<Mutex<Option<SyncTask>>>,
}

impl StatusSyncController {
    pub fn new(
        gateway: Arc<dyn VoiceGateway>,
        session: ListeningSessionController,
        notices: NoticeFeed,
    ) -> Self {
        let (telemetry_tx, _) = watch::channel(DeviceTelemetry::default());
        let (commands_tx, _) = watch::channel(Vec::new());
        Self {
            gateway,
            session,
            notices,
            telemetry_tx: Arc::new(telemetry_tx),
            commands_tx: Arc::new(commands_tx),
            task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn telemetry(&self) -> watch::Receiver<DeviceTelemetry> {
        self.telemetry_tx.subscribe()
    }

    pub fn recent_commands(&self) -> watch::Receiver<Vec<CommandLogEntry>> {
        self.commands_tx.subscribe()
    }

    /// Spawns the refresh loop. A second start while the loop is running is a
    /// no-op.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            debug!("status sync already running");
            return;
        }

        let cancel_token = CancellationToken::new();
        let shared = SyncShared {
            gateway: Arc::clone(&self.gateway),
            session: self.session.clone(),
            telemetry_tx: Arc::clone(&self.telemetry_tx),
            commands_tx: Arc::clone(&self.commands_tx),
            notices: self.notices.clone(),
        };
        let handle = tokio::spawn(status_sync_loop(shared, cancel_token.clone()));

        *task = Some(SyncTask {
            handle,
            cancel_token,
        });
    }

    /// Cancels the loop and waits for it to wind down. No ticks fire after
    /// this returns, and a cycle that was in flight is discarded unapplied.
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            task.cancel_token.cancel();
            if let Err(err) = task.handle.await {
                debug!("status sync task did not join cleanly: {err}");
            }
        }
    }
}
