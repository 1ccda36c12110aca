//! HTTP client for the external task-execution API.
//!
//! Two operations: submit a run (dispatch path) and fetch a completed run's
//! result (callback path). Calls fail fast on non-2xx responses; retries are
//! deliberately absent everywhere in scout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use scout_core::event::RunMetadata;
use scout_core::{Error, Result, ResultFetcher};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the shared API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Webhook subscription attached to every submission.
#[derive(Clone, Serialize)]
pub struct WebhookSubscription {
    /// Callback URL for status-change deliveries.
    pub url: String,
    /// Event types to notify on.
    pub event_types: Vec<String>,
    /// Shared secret the execution API signs deliveries with.
    pub secret: String,
}

impl std::fmt::Debug for WebhookSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSubscription")
            .field("url", &self.url)
            .field("event_types", &self.event_types)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// One run submission.
#[derive(Debug, Clone, Serialize)]
pub struct RunSubmission {
    /// Research query text.
    pub input: String,
    /// Processor tier selector.
    pub processor: String,
    /// Output schema descriptor (text or JSON schema).
    pub output_schema: Value,
    /// Correlation metadata; must carry the originating task slug.
    pub metadata: RunMetadata,
    /// Webhook subscription for completion notifications.
    pub webhook: WebhookSubscription,
}

/// Handle returned for an accepted submission.
#[derive(Debug, Clone, Deserialize)]
pub struct RunHandle {
    /// External run identifier.
    pub run_id: String,
}

#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    #[serde(default)]
    output: Option<ResultOutput>,
}

#[derive(Debug, Deserialize)]
struct ResultOutput {
    content: Value,
}

/// HTTP client for the task-execution API.
#[derive(Clone)]
pub struct TaskApiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for TaskApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TaskApiClient {
    /// Creates a new client targeting the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn runs_url(&self) -> String {
        format!("{}/v1/tasks/runs", self.base_url.trim_end_matches('/'))
    }

    fn result_url(&self, run_id: &str) -> String {
        format!(
            "{}/v1/tasks/runs/{run_id}/result",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Submits one run for asynchronous execution.
    ///
    /// # Errors
    ///
    /// Returns `Error::Upstream` on network failure or a non-2xx response.
    pub async fn submit_run(&self, submission: &RunSubmission) -> Result<RunHandle> {
        let response = self
            .client
            .post(self.runs_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(submission)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("run submission failed: {e}")))?;

        if response.status().is_success() {
            return response
                .json::<RunHandle>()
                .await
                .map_err(|e| Error::upstream(format!("invalid run submission response: {e}")));
        }

        Err(error_from_response("run submission", response).await)
    }
}

#[async_trait]
impl ResultFetcher for TaskApiClient {
    async fn fetch_result(&self, run_id: &str) -> Result<Value> {
        let response = self
            .client
            .get(self.result_url(run_id))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("result fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(error_from_response("result fetch", response).await);
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("invalid result document: {e}")))?;

        // The result endpoint wraps the payload in an output envelope; older
        // deployments return the payload bare.
        match serde_json::from_value::<ResultEnvelope>(document.clone()) {
            Ok(ResultEnvelope {
                output: Some(output),
            }) => Ok(output.content),
            _ => Ok(document),
        }
    }
}

async fn error_from_response(operation: &str, response: reqwest::Response) -> Error {
    let status = response.status();
    let message = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| String::from_utf8_lossy(&body).to_string()),
        Err(e) => format!("failed reading error body: {e}"),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::upstream(format!("{operation} rejected ({status}): check API key"))
        }
        _ => Error::upstream(format!("{operation} failed ({status}): {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::Path;
    use axum::routing::{get, post};
    use serde_json::json;

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }

    fn sample_submission() -> RunSubmission {
        RunSubmission {
            input: "What happened today?".to_string(),
            processor: "core".to_string(),
            output_schema: json!({ "type": "object" }),
            metadata: RunMetadata {
                task_slug: Some("daily-news".to_string()),
            },
            webhook: WebhookSubscription {
                url: "https://scout.example.com/webhook".to_string(),
                event_types: vec!["task_run.status".to_string()],
                secret: "test-key".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn submit_run_returns_run_handle() {
        let router = Router::new().route(
            "/v1/tasks/runs",
            post(|| async { axum::Json(json!({ "run_id": "run_abc123" })) }),
        );
        let base_url = spawn_upstream(router).await;
        let client = TaskApiClient::new(base_url, "test-key");

        let handle = client
            .submit_run(&sample_submission())
            .await
            .expect("submit");
        assert_eq!(handle.run_id, "run_abc123");
    }

    #[tokio::test]
    async fn submit_run_maps_non_2xx_to_upstream_error() {
        let router = Router::new().route(
            "/v1/tasks/runs",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    axum::Json(json!({ "message": "bad processor" })),
                )
            }),
        );
        let base_url = spawn_upstream(router).await;
        let client = TaskApiClient::new(base_url, "test-key");

        let err = client.submit_run(&sample_submission()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
        assert!(err.to_string().contains("bad processor"));
    }

    #[tokio::test]
    async fn fetch_result_unwraps_output_envelope() {
        let router = Router::new().route(
            "/v1/tasks/runs/:run_id/result",
            get(|Path(run_id): Path<String>| async move {
                axum::Json(json!({
                    "run": { "run_id": run_id, "status": "completed" },
                    "output": { "content": { "headline": "X" } }
                }))
            }),
        );
        let base_url = spawn_upstream(router).await;
        let client = TaskApiClient::new(base_url, "test-key");

        let payload = client.fetch_result("run_abc123").await.expect("fetch");
        assert_eq!(payload, json!({ "headline": "X" }));
    }

    #[tokio::test]
    async fn fetch_result_accepts_bare_payload() {
        let router = Router::new().route(
            "/v1/tasks/runs/:run_id/result",
            get(|| async { axum::Json(json!({ "headline": "bare" })) }),
        );
        let base_url = spawn_upstream(router).await;
        let client = TaskApiClient::new(base_url, "test-key");

        let payload = client.fetch_result("run_abc123").await.expect("fetch");
        assert_eq!(payload, json!({ "headline": "bare" }));
    }

    #[tokio::test]
    async fn fetch_result_fails_fast_on_server_error() {
        let router = Router::new().route(
            "/v1/tasks/runs/:run_id/result",
            get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base_url = spawn_upstream(router).await;
        let client = TaskApiClient::new(base_url, "test-key");

        let err = client.fetch_result("run_abc123").await.unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
    }
}
