pub mod http;
pub mod types;

pub use http::{ConfigError, GatewayConfig, HttpGateway, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, ENV_BASE_URL};
pub use types::{CommandLogEntry, ExecuteOutcome, MicrophoneInfo, StatusReport};

use async_trait::async_trait;
use thiserror::Error;

use crate::settings::SettingsDocument;

/// How a single exchange with the remote service can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No connection, or the request exceeded its bounded wait.
    #[error("voice service unreachable: {0}")]
    Unreachable(String),
    /// The service answered and rejected the request.
    #[error("voice service error: {0}")]
    Service(String),
    /// The reply arrived but its shape violates the contract. Malformed
    /// replies are discarded whole, never partially applied.
    #[error("malformed reply from voice service: {0}")]
    Malformed(String),
}

/// Typed wrapper around the remote service's operations. One method per
/// backend capability, each a single request/response exchange with no retry
/// baked in; retry policy belongs to the caller.
///
/// `start`, `stop`, and `execute` have side effects on the remote machine and
/// must not be blindly retried without checking current state first. The
/// remaining operations are idempotent.
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    async fn status(&self) -> Result<StatusReport, GatewayError>;

    async fn start(&self) -> Result<(), GatewayError>;

    async fn stop(&self) -> Result<(), GatewayError>;

    /// Runs one command remotely. Implementations map an in-body non-success
    /// status to [`GatewayError::Service`], so an `Ok` outcome is always a
    /// confirmed success.
    async fn execute(&self, command: &str) -> Result<ExecuteOutcome, GatewayError>;

    /// Remote command history in wire order (the service appends, so oldest
    /// entries come first).
    async fn recent_commands(&self) -> Result<Vec<CommandLogEntry>, GatewayError>;

    async fn settings(&self) -> Result<SettingsDocument, GatewayError>;

    /// Publishes the full settings document; there is no field-level save.
    async fn update_settings(&self, document: &SettingsDocument) -> Result<(), GatewayError>;

    async fn microphones(&self) -> Result<Vec<MicrophoneInfo>, GatewayError>;

    /// Connection probe against the service's test endpoint.
    async fn ping(&self) -> Result<(), GatewayError>;
}
