use std::sync::Arc;

use log::{info, warn};
use tokio::sync::{watch, Mutex};

use crate::gateway::VoiceGateway;
use crate::notice::NoticeFeed;
use crate::ClientError;

use super::state::{SessionState, TransitionDirection};

/// Owns the [`SessionState`] machine and mediates start/stop requests against
/// the gateway.
///
/// A toggle issued while a transition is in flight is rejected with
/// [`ClientError::Busy`] before any gateway traffic, so two rapid taps can
/// never race conflicting start/stop calls. A failed transition rolls back to
/// the exact state it left; `Listening` is only ever reported after the
/// gateway confirmed it.
#[derive(Clone)]
pub struct ListeningSessionController {
    gateway: Arc<dyn VoiceGateway>,
    state: Arc<Mutex<SessionState>>,
    state_tx: Arc<watch::Sender<SessionState>>,
    notices: NoticeFeed,
}

impl ListeningSessionController {
    pub fn new(gateway: Arc<dyn VoiceGateway>, notices: NoticeFeed) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            gateway,
            state: Arc::new(Mutex::new(SessionState::Idle)),
            state_tx: Arc::new(state_tx),
            notices,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub async fn current(&self) -> SessionState {
        *self.state.lock().await
    }

    /// Starts listening when idle, stops when listening. Returns the
    /// confirmed state on success.
    pub async fn toggle(&self) -> Result<SessionState, ClientError> {
        let direction = {
            let mut state = self.state.lock().await;
            let direction = match *state {
                SessionState::Transitioning(_) => return Err(ClientError::Busy),
                SessionState::Idle => TransitionDirection::Start,
                SessionState::Listening => TransitionDirection::Stop,
            };
            *state = SessionState::Transitioning(direction);
            direction
        };
        self.state_tx.send_replace(SessionState::Transitioning(direction));

        let result = match direction {
            TransitionDirection::Start => self.gateway.start().await,
            TransitionDirection::Stop => self.gateway.stop().await,
        };

        let mut state = self.state.lock().await;
        match result {
            Ok(()) => {
                let confirmed = match direction {
                    TransitionDirection::Start => SessionState::Listening,
                    TransitionDirection::Stop => SessionState::Idle,
                };
                *state = confirmed;
                self.state_tx.send_replace(confirmed);
                info!("listening session now {confirmed:?}");
                Ok(confirmed)
            }
            Err(err) => {
                // Roll back to the state the transition left, never to a new
                // unconfirmed assumption.
                let rolled_back = match direction {
                    TransitionDirection::Start => SessionState::Idle,
                    TransitionDirection::Stop => SessionState::Listening,
                };
                *state = rolled_back;
                self.state_tx.send_replace(rolled_back);
                warn!("listening toggle failed, rolled back to {rolled_back:?}: {err}");
                let verb = match direction {
                    TransitionDirection::Start => "start",
                    TransitionDirection::Stop => "stop",
                };
                self.notices
                    .error(format!("Could not {verb} listening: {err}"));
                Err(err.into())
            }
        }
    }

    /// Reconciles a resting state against the service's report. The service
    /// is authoritative at rest; mid-transition the client's view wins and
    /// the report is ignored.
    pub async fn reconcile(&self, service_listening: bool) {
        let mut state = self.state.lock().await;
        let corrected = match (*state, service_listening) {
            (SessionState::Idle, true) => SessionState::Listening,
            (SessionState::Listening, false) => SessionState::Idle,
            _ => return,
        };
        warn!("session state corrected to match the service: {corrected:?}");
        *state = corrected;
        self.state_tx.send_replace(corrected);
    }
}
