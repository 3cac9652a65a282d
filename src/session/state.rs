use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransitionDirection {
    Start,
    Stop,
}

/// Where the remote listening session stands from the client's point of view.
///
/// `Transitioning` is the in-flight marker for a start/stop exchange: it is
/// entered when the request is issued and always resolves to exactly one
/// resting state when the exchange completes, confirmed or rolled back. It is
/// never a resting state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Listening,
    Transitioning(TransitionDirection),
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

impl SessionState {
    pub fn is_listening(&self) -> bool {
        matches!(self, SessionState::Listening)
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self, SessionState::Transitioning(_))
    }
}
