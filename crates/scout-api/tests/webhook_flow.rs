//! End-to-end webhook flow tests.
//!
//! Exercise the full callback path: signed delivery → verification → event
//! routing → result fetch from a mock execution API → persistence, observing
//! the shared result store directly.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;

use scout_api::config::Config;
use scout_api::server::Server;
use scout_core::store::{MemoryStore, ResultStore};
use scout_core::{ResultStatus, StoredResult, TaskRegistry, signature};

const TEST_API_KEY: &str = "test-api-key";

struct TestHarness {
    router: Router,
    store: Arc<MemoryStore>,
}

/// Builds a server wired to the given mock upstream, sharing its store with
/// the test for direct inspection.
fn harness(upstream_url: &str) -> TestHarness {
    let config = Config {
        debug: true,
        api_key: TEST_API_KEY.to_string(),
        upstream_url: upstream_url.to_string(),
        ..Config::default()
    };
    let registry = TaskRegistry::builtin().expect("builtin registry");
    let store = Arc::new(MemoryStore::new());
    let server = Server::with_store(config, registry, Arc::clone(&store) as Arc<dyn ResultStore>);
    TestHarness {
        router: server.test_router(),
        store,
    }
}

/// Mock execution API whose result endpoint echoes the run id back in the
/// payload, so tests can tell which run a stored result came from.
async fn spawn_result_upstream() -> String {
    let app = Router::new().route(
        "/v1/tasks/runs/:run_id/result",
        get(|Path(run_id): Path<String>| async move {
            axum::Json(json!({
                "run": { "run_id": run_id.clone(), "status": "completed" },
                "output": { "content": { "headline": run_id } }
            }))
        }),
    );
    spawn(app).await
}

/// Mock execution API whose result endpoint always fails.
async fn spawn_failing_upstream() -> String {
    let app = Router::new().route(
        "/v1/tasks/runs/:run_id/result",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    spawn(app).await
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn status_event(run_id: &str, status: &str, slug: &str) -> String {
    json!({
        "type": "task_run.status",
        "data": {
            "run_id": run_id,
            "status": status,
            "metadata": { "task_slug": slug }
        }
    })
    .to_string()
}

fn signed_webhook(body: &str, secret: &str, timestamp: i64) -> Request<Body> {
    let timestamp = timestamp.to_string();
    let signature = signature::sign(secret, "msg-1", &timestamp, body.as_bytes());
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("webhook-id", "msg-1")
        .header("webhook-timestamp", timestamp)
        .header("webhook-signature", signature)
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn signed_now(body: &str, secret: &str) -> Request<Body> {
    signed_webhook(body, secret, Utc::now().timestamp())
}

#[tokio::test]
async fn test_completed_run_is_fetched_and_stored() -> Result<()> {
    let upstream = spawn_result_upstream().await;
    let harness = harness(&upstream);

    let body = status_event("run_abc123", "completed", "daily-news");
    let response = harness
        .router
        .oneshot(signed_now(&body, TEST_API_KEY))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let stored = harness
        .store
        .get("daily-news")
        .await?
        .expect("result stored");
    assert_eq!(stored.status, ResultStatus::Completed);
    assert_eq!(stored.result, Some(json!({ "headline": "run_abc123" })));
    assert!(stored.error.is_none());
    Ok(())
}

#[tokio::test]
async fn test_failed_run_stores_error_message() -> Result<()> {
    let upstream = spawn_result_upstream().await;
    let harness = harness(&upstream);

    let body = json!({
        "type": "task_run.status",
        "data": {
            "run_id": "run_abc123",
            "status": "failed",
            "metadata": { "task_slug": "daily-news" },
            "error": { "message": "timeout" }
        }
    })
    .to_string();

    let response = harness
        .router
        .oneshot(signed_now(&body, TEST_API_KEY))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = harness
        .store
        .get("daily-news")
        .await?
        .expect("result stored");
    assert_eq!(stored.status, ResultStatus::Failed);
    assert!(stored.result.is_none());
    assert_eq!(stored.error.as_deref(), Some("timeout"));
    Ok(())
}

#[tokio::test]
async fn test_wrong_secret_is_401_and_store_unchanged() -> Result<()> {
    let upstream = spawn_result_upstream().await;
    let harness = harness(&upstream);

    let body = status_event("run_abc123", "completed", "daily-news");
    let response = harness
        .router
        .oneshot(signed_now(&body, "some-other-secret"))
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(harness.store.get("daily-news").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_stale_timestamp_is_400() -> Result<()> {
    let upstream = spawn_result_upstream().await;
    let harness = harness(&upstream);

    let body = status_event("run_abc123", "completed", "daily-news");
    let stale = Utc::now().timestamp() - 301;
    let response = harness
        .router
        .oneshot(signed_webhook(&body, TEST_API_KEY, stale))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(harness.store.get("daily-news").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_400_even_when_signed() -> Result<()> {
    let upstream = spawn_result_upstream().await;
    let harness = harness(&upstream);

    let response = harness
        .router
        .oneshot(signed_now("this is not json", TEST_API_KEY))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_unknown_slug_is_acknowledged_without_write() -> Result<()> {
    let upstream = spawn_result_upstream().await;
    let harness = harness(&upstream);

    let body = status_event("run_abc123", "completed", "not-a-registered-task");
    let response = harness
        .router
        .oneshot(signed_now(&body, TEST_API_KEY))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let ack = axum::body::to_bytes(response.into_body(), 1 << 16).await?;
    assert!(String::from_utf8_lossy(&ack).contains("unroutable"));
    assert!(harness.store.get("daily-news").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_unrecognized_event_type_is_acknowledged() -> Result<()> {
    let upstream = spawn_result_upstream().await;
    let harness = harness(&upstream);

    let body = json!({
        "type": "task_run.progress",
        "data": { "run_id": "run_abc123", "status": "running" }
    })
    .to_string();

    let response = harness
        .router
        .oneshot(signed_now(&body, TEST_API_KEY))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_keeps_prior_result() -> Result<()> {
    let upstream = spawn_failing_upstream().await;
    let harness = harness(&upstream);

    let registry = TaskRegistry::builtin()?;
    let prior = StoredResult::completed(
        registry.get("daily-news").cloned().expect("task"),
        json!({ "headline": "yesterday" }),
        Utc::now(),
    );
    harness.store.put("daily-news", &prior).await?;

    let body = status_event("run_abc123", "completed", "daily-news");
    let response = harness
        .router
        .oneshot(signed_now(&body, TEST_API_KEY))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let ack = axum::body::to_bytes(response.into_body(), 1 << 16).await?;
    assert!(String::from_utf8_lossy(&ack).contains("fetch_failed"));

    let stored = harness.store.get("daily-news").await?.expect("prior kept");
    assert_eq!(stored.result, Some(json!({ "headline": "yesterday" })));
    Ok(())
}

#[tokio::test]
async fn test_second_completion_overwrites_first() -> Result<()> {
    let upstream = spawn_result_upstream().await;
    let harness = harness(&upstream);

    for run_id in ["run_first", "run_second"] {
        let body = status_event(run_id, "completed", "daily-news");
        let response = harness
            .router
            .clone()
            .oneshot(signed_now(&body, TEST_API_KEY))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let stored = harness
        .store
        .get("daily-news")
        .await?
        .expect("result stored");
    assert_eq!(stored.result, Some(json!({ "headline": "run_second" })));
    Ok(())
}

#[tokio::test]
async fn test_stored_result_renders_on_pages() -> Result<()> {
    let upstream = spawn_result_upstream().await;
    let harness = harness(&upstream);

    let body = status_event("run_abc123", "completed", "daily-news");
    let response = harness
        .router
        .clone()
        .oneshot(signed_now(&body, TEST_API_KEY))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let page = harness
        .router
        .oneshot(Request::builder().uri("/daily-news").body(Body::empty())?)
        .await?;
    assert_eq!(page.status(), StatusCode::OK);
    let html = axum::body::to_bytes(page.into_body(), 1 << 20).await?;
    let html = String::from_utf8_lossy(&html);
    assert!(html.contains("run_abc123"));
    assert!(html.contains("completed"));
    Ok(())
}
