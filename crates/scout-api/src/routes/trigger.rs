//! Manual dispatch trigger.
//!
//! `GET /run?key=<secret>` fires a dispatch pass outside the daily schedule.
//! The key must exactly match the configured shared secret; on match the
//! dispatch runs on a detached task and the response returns immediately,
//! without waiting for submissions to finish.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch;
use crate::error::ApiError;
use crate::server::AppState;

/// Query parameters for the manual trigger.
#[derive(Debug, Deserialize)]
pub struct TriggerParams {
    /// Shared secret; must match the configured API key exactly.
    #[serde(default)]
    pub key: Option<String>,
}

/// Response body for an accepted trigger.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAck {
    /// Whether the dispatch was accepted.
    pub accepted: bool,
    /// Number of tasks that will be submitted.
    pub tasks: usize,
    /// Server timestamp.
    pub server_time: DateTime<Utc>,
}

/// Fires a dispatch pass when the caller presents the shared secret.
pub(crate) async fn run_trigger(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TriggerParams>,
) -> Result<impl IntoResponse, ApiError> {
    if params.key.as_deref() != Some(state.config.api_key.as_str()) {
        tracing::warn!("manual trigger rejected: key mismatch");
        return Err(ApiError::unauthorized("invalid trigger key"));
    }

    let tasks = state.registry().len();
    tracing::info!(tasks, "manual trigger accepted");

    let dispatch_state = Arc::clone(&state);
    tokio::spawn(async move {
        dispatch::dispatch_all(&dispatch_state).await;
    });

    Ok(Json(TriggerAck {
        accepted: true,
        tasks,
        server_time: Utc::now(),
    }))
}
