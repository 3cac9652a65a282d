use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Listening flag reported by `GET /status`. The service also echoes its wake
/// word and settings in the same payload; only the flag is consumed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    pub is_listening: bool,
}

/// Body of a `POST /execute` reply. Telemetry-style commands fill in the
/// numeric fields; plain automation commands only carry `status`/`message`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecuteOutcome {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cpu_percent: Option<f32>,
    #[serde(default)]
    pub memory_percent: Option<f32>,
    #[serde(default)]
    pub disk_percent: Option<f32>,
    #[serde(default)]
    pub battery_level: Option<f32>,
    #[serde(default)]
    pub plugged_in: Option<bool>,
}

impl ExecuteOutcome {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// One entry of the remote command history. The wire carries only the command
/// text and a timestamp; `outcome` is reserved for services that report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandLogEntry {
    pub command: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// The service emits naive ISO-8601 timestamps (no offset); newer builds use
/// RFC 3339. Naive values are taken as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(stamped) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(stamped.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(serde::de::Error::custom)
}

/// Input device advertised by `GET /microphones`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrophoneInfo {
    pub id: i64,
    pub name: String,
}

/// Minimal acknowledgement body used by `POST /settings` and `GET /test`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Ack {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}
