//! Stored results: the latest outcome per task slug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::TaskDefinition;

/// Completion status of a stored result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// The run finished and produced a result payload.
    Completed,
    /// The run failed; `error` carries the reported message.
    Failed,
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// The latest result for one task, overwritten on every completion.
///
/// At most one `StoredResult` exists per slug; a new completion for a slug
/// unconditionally replaces the previous one. Written only by the callback
/// path, read-only to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResult {
    /// Snapshot of the originating task definition at completion time.
    pub task: TaskDefinition,
    /// Completion status.
    pub status: ResultStatus,
    /// Result payload for completed runs; absent for failed runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Reported error message for failed runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When this entry was written.
    pub updated_at: DateTime<Utc>,
}

impl StoredResult {
    /// Builds a completed result with the given payload.
    #[must_use]
    pub fn completed(task: TaskDefinition, result: Value, updated_at: DateTime<Utc>) -> Self {
        Self {
            task,
            status: ResultStatus::Completed,
            result: Some(result),
            error: None,
            updated_at,
        }
    }

    /// Builds a failed result carrying the reported error message.
    #[must_use]
    pub fn failed(
        task: TaskDefinition,
        error: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task,
            status: ResultStatus::Failed,
            result: None,
            error: Some(error.into()),
            updated_at,
        }
    }
}
