//! Webhook event envelope types.
//!
//! The execution API notifies run status changes as JSON envelopes:
//!
//! ```json
//! {
//!   "type": "task_run.status",
//!   "data": {
//!     "run_id": "run_abc123",
//!     "status": "completed",
//!     "metadata": { "task_slug": "daily-news" },
//!     "error": { "message": "..." }
//!   }
//! }
//! ```
//!
//! Unknown event types and statuses are preserved rather than rejected so
//! the callback handler can acknowledge them without sender-side retries.

use serde::{Deserialize, Serialize};

/// Event type discriminator for run status changes.
pub const STATUS_EVENT_TYPE: &str = "task_run.status";

/// Top-level webhook envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event type discriminator (e.g. `task_run.status`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: RunData,
}

impl WebhookEvent {
    /// Returns true when this is a run status-change event.
    #[must_use]
    pub fn is_status_event(&self) -> bool {
        self.event_type == STATUS_EVENT_TYPE
    }
}

/// Status-change payload for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunData {
    /// External run identifier.
    pub run_id: String,
    /// Reported run status.
    pub status: RunStatus,
    /// Metadata echoed back from submission time.
    #[serde(default)]
    pub metadata: RunMetadata,
    /// Error details, present for failed runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
}

/// Run status as reported by the execution API.
///
/// Only `completed` and `failed` drive persistence; everything else is an
/// intermediate state that gets acknowledged without action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run finished successfully; the full result can be fetched.
    Completed,
    /// The run failed terminally.
    Failed,
    /// Any other (intermediate or future) status.
    #[serde(other)]
    Other,
}

/// Submission metadata echoed back in the event.
///
/// The originating task slug must ride along here or the event cannot be
/// routed back to its task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Slug of the task that dispatched this run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_slug: Option<String>,
}

/// Error details reported for a failed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    /// Human-readable failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
