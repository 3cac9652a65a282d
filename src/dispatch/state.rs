use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Transient record of one dispatched command. Created on every dispatch,
/// cleared after the display window or when the next dispatch starts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommandExecution {
    pub id: Uuid,
    pub command: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
}

impl CommandExecution {
    pub fn pending(command: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            command: command.into(),
            status: ExecutionStatus::Pending,
            started_at: Utc::now(),
        }
    }
}
