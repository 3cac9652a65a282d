use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::types::{Ack, CommandLogEntry, ExecuteOutcome, MicrophoneInfo, StatusReport};
use super::{GatewayError, VoiceGateway};
use crate::settings::SettingsDocument;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";
pub const ENV_BASE_URL: &str = "VOICELINK_BASE_URL";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("base url must not be empty")]
    EmptyBaseUrl,
    #[error("base url must use http:// or https:// and include a host")]
    InvalidBaseUrl,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `VOICELINK_BASE_URL`, falling back to the default local address.
    pub fn from_env() -> Self {
        let base_url = std::env::var(ENV_BASE_URL)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Production [`VoiceGateway`] speaking JSON over HTTP to the service bridge.
/// Every request carries a bounded timeout so a dead connection fails with
/// [`GatewayError::Unreachable`] instead of stalling the caller.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self {
            base_url,
            timeout: config.timeout,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;
        decode_json(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.endpoint(path))
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        decode_json(response).await
    }

    /// POST with no body where only the HTTP status carries the verdict.
    async fn post_ok(&self, path: &str) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(service_error(status, &body));
        }
        Ok(())
    }
}

#[async_trait]
impl VoiceGateway for HttpGateway {
    async fn status(&self) -> Result<StatusReport, GatewayError> {
        self.get_json("/status").await
    }

    async fn start(&self) -> Result<(), GatewayError> {
        self.post_ok("/start").await
    }

    async fn stop(&self) -> Result<(), GatewayError> {
        self.post_ok("/stop").await
    }

    async fn execute(&self, command: &str) -> Result<ExecuteOutcome, GatewayError> {
        let body = serde_json::json!({ "command": command });
        let outcome: ExecuteOutcome = self.post_json("/execute", &body).await?;
        if !outcome.is_success() {
            let reason = outcome
                .message
                .unwrap_or_else(|| format!("command rejected with status '{}'", outcome.status));
            return Err(GatewayError::Service(reason));
        }
        Ok(outcome)
    }

    async fn recent_commands(&self) -> Result<Vec<CommandLogEntry>, GatewayError> {
        self.get_json("/recent").await
    }

    async fn settings(&self) -> Result<SettingsDocument, GatewayError> {
        self.get_json("/settings").await
    }

    async fn update_settings(&self, document: &SettingsDocument) -> Result<(), GatewayError> {
        let ack: Ack = self.post_json("/settings", document).await?;
        if ack.status != "success" {
            let reason = ack
                .message
                .unwrap_or_else(|| format!("settings update rejected with status '{}'", ack.status));
            return Err(GatewayError::Service(reason));
        }
        Ok(())
    }

    async fn microphones(&self) -> Result<Vec<MicrophoneInfo>, GatewayError> {
        self.get_json("/microphones").await
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        let ack: Ack = self.get_json("/test").await?;
        if ack.status != "ok" {
            return Err(GatewayError::Service(format!(
                "test endpoint answered with status '{}'",
                ack.status
            )));
        }
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Unreachable(err.to_string())
}

fn service_error(status: reqwest::StatusCode, body: &[u8]) -> GatewayError {
    let body = String::from_utf8_lossy(body);
    let body = body.trim();
    if body.is_empty() {
        GatewayError::Service(status.to_string())
    } else {
        GatewayError::Service(format!("{status}: {body}"))
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| GatewayError::Unreachable(err.to_string()))?;
    if !status.is_success() {
        return Err(service_error(status, &bytes));
    }
    serde_json::from_slice(&bytes).map_err(|err| GatewayError::Malformed(err.to_string()))
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl);
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidBaseUrl);
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}
