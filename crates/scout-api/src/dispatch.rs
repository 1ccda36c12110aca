//! Dispatch: fan-out of every registered task to the execution API.
//!
//! One submission per task, sequentially. A submission failure is logged and
//! the remaining tasks still go out; partial failure is expected and there is
//! no retry within a dispatch. Callers that must respond promptly (the manual
//! trigger) spawn this onto a detached task.

use scout_core::event::{RunMetadata, STATUS_EVENT_TYPE};
use scout_core::observability::task_span;
use tracing::Instrument;

use crate::server::AppState;
use crate::upstream::{RunSubmission, WebhookSubscription};

/// Counts for one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Submissions accepted by the execution API.
    pub submitted: usize,
    /// Submissions that failed (logged, not retried).
    pub failed: usize,
}

/// Submits every registered task to the execution API.
///
/// Never fails as a whole: per-task outcomes are aggregated into the
/// returned summary.
pub async fn dispatch_all(state: &AppState) -> DispatchSummary {
    let webhook_url = state.config.webhook_url();
    let mut summary = DispatchSummary::default();

    for task in state.registry().iter() {
        let submission = RunSubmission {
            input: task.query.clone(),
            processor: state
                .config
                .processor
                .clone()
                .unwrap_or_else(|| task.processor.clone()),
            output_schema: task.output_schema.clone(),
            metadata: RunMetadata {
                task_slug: Some(task.slug.clone()),
            },
            webhook: WebhookSubscription {
                url: webhook_url.clone(),
                event_types: vec![STATUS_EVENT_TYPE.to_string()],
                secret: state.config.api_key.clone(),
            },
        };

        let result = state
            .upstream()
            .submit_run(&submission)
            .instrument(task_span("dispatch", &task.slug))
            .await;

        match result {
            Ok(handle) => {
                tracing::info!(run_id = %handle.run_id, slug = %task.slug, "submitted run");
                summary.submitted += 1;
            }
            Err(e) => {
                tracing::warn!(slug = %task.slug, error = %e, "run submission failed; continuing");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        submitted = summary.submitted,
        failed = summary.failed,
        "dispatch pass finished"
    );
    summary
}
