//! Daily dispatch scheduling.
//!
//! A single background task sleeps until the configured UTC wall-clock time,
//! runs a dispatch pass, and repeats. Dispatch outcomes are logged and never
//! fatal to the loop.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use tokio::task::JoinHandle;

use crate::dispatch;
use crate::server::AppState;

/// Returns the next occurrence of `at` (UTC wall-clock) strictly after `now`.
#[must_use]
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Spawns the daily dispatch loop.
///
/// The returned handle is typically dropped; the loop runs for the life of
/// the process.
pub fn spawn_daily(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_run_after(now, state.config.dispatch_time);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::info!(next = %next, "scheduler waiting for next dispatch");
            tokio::time::sleep(wait).await;

            let summary = dispatch::dispatch_all(&state).await;
            tracing::info!(
                submitted = summary.submitted,
                failed = summary.failed,
                "scheduled dispatch finished"
            );
        }
    })
}
