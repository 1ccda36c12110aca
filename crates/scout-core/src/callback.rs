//! Callback routing: correlating verified webhook events back to tasks.
//!
//! The handler trusts the execution API to echo the originating task slug in
//! event metadata (stateless correlation — no in-flight run table). Events
//! that cannot be routed are acknowledged and dropped so the sender does not
//! retry them; only a store write failure is an error the HTTP layer must
//! surface.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::error::Result;
use crate::event::{RunStatus, WebhookEvent};
use crate::registry::TaskRegistry;
use crate::result::{ResultStatus, StoredResult};
use crate::store::ResultStore;

/// Fetches the full result payload for a completed run.
///
/// Implemented by the HTTP client for the execution API; kept as a trait so
/// the routing logic can be exercised without a network.
#[async_trait]
pub trait ResultFetcher: Send + Sync + 'static {
    /// Returns the result payload for `run_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Upstream` when the fetch fails; the caller treats
    /// that as a tolerated loss, not a request failure.
    async fn fetch_result(&self, run_id: &str) -> Result<Value>;
}

/// What the handler did with an event, for logging and acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// A result was persisted for the named slug.
    Stored {
        /// Slug the result was stored under.
        slug: String,
        /// Status that was written.
        status: ResultStatus,
    },
    /// The event type is not a status change; acknowledged without action.
    IgnoredEventType,
    /// An intermediate status (queued, running, ...); acknowledged.
    IgnoredStatus,
    /// The event carried no slug, or a slug not present in the registry.
    Unroutable {
        /// Why the event could not be routed.
        reason: String,
    },
    /// The run completed but the result fetch failed; the prior stored
    /// result (if any) remains authoritative.
    FetchFailed,
}

/// Routes a verified, parsed webhook event.
///
/// The signature must already have been checked; this function decides what
/// the event means and writes to the store when appropriate.
///
/// # Errors
///
/// Returns an error only when persisting a result fails. Upstream fetch
/// failures and unroutable events are `Ok` outcomes by design.
pub async fn handle_event(
    registry: &TaskRegistry,
    store: &dyn ResultStore,
    fetcher: &dyn ResultFetcher,
    event: WebhookEvent,
) -> Result<CallbackOutcome> {
    if !event.is_status_event() {
        tracing::debug!(event_type = %event.event_type, "ignoring non-status webhook event");
        return Ok(CallbackOutcome::IgnoredEventType);
    }

    let data = event.data;
    let Some(slug) = data.metadata.task_slug.as_deref() else {
        tracing::warn!(run_id = %data.run_id, "status event without task_slug metadata");
        return Ok(CallbackOutcome::Unroutable {
            reason: "missing task_slug metadata".to_string(),
        });
    };

    let Some(task) = registry.get(slug) else {
        tracing::warn!(run_id = %data.run_id, slug = %slug, "status event for unknown task");
        return Ok(CallbackOutcome::Unroutable {
            reason: format!("unknown task slug {slug:?}"),
        });
    };

    match data.status {
        RunStatus::Completed => {
            let payload = match fetcher.fetch_result(&data.run_id).await {
                Ok(payload) => payload,
                Err(e) => {
                    // The prior stored result stays authoritative; the next
                    // scheduled dispatch produces a fresh run.
                    tracing::warn!(
                        run_id = %data.run_id,
                        slug = %slug,
                        error = %e,
                        "result fetch failed; dropping completion"
                    );
                    return Ok(CallbackOutcome::FetchFailed);
                }
            };

            let stored = StoredResult::completed(task.clone(), payload, Utc::now());
            store.put(slug, &stored).await?;
            tracing::info!(run_id = %data.run_id, slug = %slug, "stored completed result");
            Ok(CallbackOutcome::Stored {
                slug: slug.to_string(),
                status: ResultStatus::Completed,
            })
        }
        RunStatus::Failed => {
            let message = data
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "run failed without an error message".to_string());

            let stored = StoredResult::failed(task.clone(), message, Utc::now());
            store.put(slug, &stored).await?;
            tracing::info!(run_id = %data.run_id, slug = %slug, "stored failed result");
            Ok(CallbackOutcome::Stored {
                slug: slug.to_string(),
                status: ResultStatus::Failed,
            })
        }
        RunStatus::Other => {
            tracing::debug!(run_id = %data.run_id, slug = %slug, "ignoring intermediate status");
            Ok(CallbackOutcome::IgnoredStatus)
        }
    }
}
