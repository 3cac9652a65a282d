use serde::{Deserialize, Serialize};

/// CPU/memory/battery readings reported by the controlled machine.
///
/// Replaced wholesale on every successful probe; a failed probe keeps the
/// last successful snapshot, it never blanks or partially merges values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTelemetry {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub battery_percent: Option<f32>,
}
