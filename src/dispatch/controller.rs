use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use uuid::Uuid;

use crate::gateway::{GatewayError, VoiceGateway};
use crate::notice::NoticeFeed;

use super::state::{CommandExecution, ExecutionStatus};

pub(super) const DISPLAY_WINDOW: Duration = Duration::from_secs(2);

/// Which dispatch currently owns the display, and its revert timer if one is
/// scheduled. Kept in one lock so a superseded dispatch can never install a
/// timer over its successor's.
#[derive(Default)]
struct DispatchSlot {
    current: Option<Uuid>,
    revert_timer: Option<JoinHandle<()>>,
}

/// Executes one-off commands with an optimistic transient record.
///
/// Every dispatch publishes a `Pending` record immediately, before the
/// gateway confirms anything. Success keeps the record visible as
/// `Succeeded` for a fixed display window, then a per-dispatch revert task
/// clears it back to the ambient state; failure clears it at once and
/// surfaces a single notice. Only one revert timer is ever live; starting a
/// new dispatch aborts the previous one. The dispatcher never touches the
/// listening session's state.
#[derive(Clone)]
pub struct CommandDispatcher {
    gateway: Arc<dyn VoiceGateway>,
    execution_tx: Arc<watch::Sender<Option<CommandExecution>>>,
    slot: Arc<Mutex<DispatchSlot>>,
    notices: NoticeFeed,
    display_window: Duration,
}

impl CommandDispatcher {
    pub fn new(gateway: Arc<dyn VoiceGateway>, notices: NoticeFeed) -> Self {
        let (execution_tx, _) = watch::channel(None);
        Self {
            gateway,
            execution_tx: Arc::new(execution_tx),
            slot: Arc::new(Mutex::new(DispatchSlot::default())),
            notices,
            display_window: DISPLAY_WINDOW,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CommandExecution>> {
        self.execution_tx.subscribe()
    }

    pub fn current(&self) -> Option<CommandExecution> {
        self.execution_tx.borrow().clone()
    }

    pub async fn dispatch(&self, command: &str) -> Result<(), GatewayError> {
        let execution = CommandExecution::pending(command);
        let id = execution.id;

        // Claiming the slot and publishing the record happen under one lock,
        // so a new dispatch atomically supersedes whatever display the
        // previous one left.
        {
            let mut slot = self.slot.lock().await;
            if let Some(previous) = slot.revert_timer.take() {
                previous.abort();
            }
            slot.current = Some(id);
            info!("dispatching command: {command}");
            self.execution_tx.send_replace(Some(execution));
        }

        match self.gateway.execute(command).await {
            Ok(outcome) => {
                if let Some(message) = outcome.message.as_deref() {
                    debug!("service reply: {message}");
                }
                let mut slot = self.slot.lock().await;
                // A dispatch that was superseded while in flight must not
                // touch the successor's record or timer.
                if slot.current == Some(id) {
                    self.execution_tx.send_modify(|current| {
                        if let Some(record) = current.as_mut() {
                            record.status = ExecutionStatus::Succeeded;
                        }
                    });
                    slot.revert_timer = Some(self.spawn_revert(id));
                }
                Ok(())
            }
            Err(err) => {
                // No display window on failure: the record goes away at once
                // and the failure is surfaced exactly once.
                let slot = self.slot.lock().await;
                if slot.current == Some(id) {
                    self.execution_tx.send_replace(None);
                }
                drop(slot);
                warn!("command '{command}' failed: {err}");
                self.notices
                    .error(format!("Could not execute \"{command}\": {err}"));
                Err(err)
            }
        }
    }

    fn spawn_revert(&self, id: Uuid) -> JoinHandle<()> {
        let execution_tx = Arc::clone(&self.execution_tx);
        let window = self.display_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Guard on the id: if a newer dispatch won the race against this
            // timer, its record must not be cleared.
            execution_tx.send_modify(|current| {
                if current.as_ref().is_some_and(|record| record.id == id) {
                    *current = None;
                }
            });
        })
    }
}
