//! Webhook callback endpoint.
//!
//! `POST /webhook` receives signed run-status deliveries from the execution
//! API. Verification happens against the raw body bytes before any parsing;
//! events that verify but cannot be acted on (unknown type, unroutable slug,
//! failed result fetch) are acknowledged `200` so the sender does not retry
//! them. Only a store write failure fails the exchange.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use scout_core::signature::{
    self, ID_HEADER, SIGNATURE_HEADER, SignatureError, SignatureHeaders, TIMESTAMP_HEADER,
};
use scout_core::{CallbackOutcome, callback};

use crate::error::ApiError;
use crate::server::AppState;

/// Acknowledgement body for accepted deliveries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    /// Whether the delivery was acknowledged.
    pub acknowledged: bool,
    /// What the handler did with the event.
    pub outcome: String,
    /// Server timestamp.
    pub server_time: DateTime<Utc>,
}

/// Receives one signed webhook delivery.
pub(crate) async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = header_string(&headers, "x-request-id")
        .unwrap_or_else(|| Ulid::new().to_string());

    let sig_headers = SignatureHeaders::new(
        header_string(&headers, ID_HEADER),
        header_string(&headers, TIMESTAMP_HEADER),
        header_string(&headers, SIGNATURE_HEADER),
    );

    let now = Utc::now().timestamp();
    if let Err(e) = signature::verify(&state.config.api_key, &sig_headers, &body, now) {
        let error = match e {
            SignatureError::MissingHeaders | SignatureError::StaleTimestamp => {
                ApiError::bad_request(e.to_string())
            }
            SignatureError::InvalidSignature => ApiError::unauthorized(e.to_string()),
        };
        tracing::warn!(error = %e, "rejected webhook delivery");
        return Err(error.with_request_id(request_id));
    }

    let event = serde_json::from_slice(&body).map_err(|e| {
        ApiError::bad_request(format!("malformed webhook body: {e}"))
            .with_request_id(request_id.clone())
    })?;

    let outcome = callback::handle_event(state.registry(), state.store(), state.upstream(), event)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(request_id))?;

    Ok(Json(WebhookAck {
        acknowledged: true,
        outcome: outcome_label(&outcome).to_string(),
        server_time: Utc::now(),
    }))
}

fn outcome_label(outcome: &CallbackOutcome) -> &'static str {
    match outcome {
        CallbackOutcome::Stored { .. } => "stored",
        CallbackOutcome::IgnoredEventType => "ignored_event_type",
        CallbackOutcome::IgnoredStatus => "ignored_status",
        CallbackOutcome::Unroutable { .. } => "unroutable",
        CallbackOutcome::FetchFailed => "fetch_failed",
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
