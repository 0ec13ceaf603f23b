use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use dfproxy_protocol::ChatRequestBody;
use dfproxy_provider::{InboundChatRequest, UpstreamResponse, translate};
use http::StatusCode;
use http::header::CONTENT_TYPE;
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::CoreState;
use crate::error::ProxyError;

/// Where a request cycle was when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    AcquiringToken,
    Invoking,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validating => "validating",
            Phase::AcquiringToken => "acquiring_token",
            Phase::Invoking => "invoking",
        };
        f.write_str(name)
    }
}

pub async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn proxy_handler(State(state): State<Arc<CoreState>>, body: Bytes) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let started_at = Instant::now();
    info!(
        event = "downstream_received",
        trace_id = %trace_id,
        body_len = body.len()
    );

    match run_cycle(&state, &trace_id, body).await {
        Ok(upstream) => {
            info!(
                event = "downstream_responded",
                trace_id = %trace_id,
                status = upstream.status,
                elapsed_ms = started_at.elapsed().as_millis()
            );
            passthrough_response(upstream)
        }
        Err((phase, err)) => {
            warn!(
                event = "downstream_responded",
                trace_id = %trace_id,
                phase = %phase,
                status = err.status().as_u16(),
                error = %err,
                elapsed_ms = started_at.elapsed().as_millis()
            );
            err.into_response()
        }
    }
}

async fn run_cycle(
    state: &CoreState,
    trace_id: &str,
    body: Bytes,
) -> Result<UpstreamResponse, (Phase, ProxyError)> {
    let parsed: ChatRequestBody = serde_json::from_slice(&body)
        .map_err(|err| (Phase::Validating, ProxyError::InvalidBody(err.to_string())))?;
    let request = InboundChatRequest::from_body(parsed)
        .map_err(|err| (Phase::Validating, ProxyError::from(err)))?;
    info!(
        event = "request_validated",
        trace_id = %trace_id,
        session_id = %request.session_id,
        utterance_len = request.utterance_text.len()
    );

    let token = state
        .tokens
        .access_token()
        .await
        .map_err(|err| (Phase::AcquiringToken, ProxyError::from(err)))?;

    let payload = translate(&request, &state.settings.agent)
        .map_err(|err| (Phase::Validating, ProxyError::from(err)))?;

    let started_at = Instant::now();
    let result = state.upstream.invoke(&payload, &token).await;
    match result {
        Ok(resp) => {
            info!(
                event = "upstream_responded",
                trace_id = %trace_id,
                status = resp.status,
                elapsed_ms = started_at.elapsed().as_millis()
            );
            Ok(resp)
        }
        Err(err) => {
            warn!(
                event = "upstream_responded",
                trace_id = %trace_id,
                status = ?err.status(),
                details = %err.details(),
                elapsed_ms = started_at.elapsed().as_millis()
            );
            // A rejected token is dropped so the next request exchanges a new one.
            if err.status() == Some(StatusCode::UNAUTHORIZED.as_u16()) {
                state.tokens.invalidate();
            }
            Err((Phase::Invoking, ProxyError::from(err)))
        }
    }
}

fn passthrough_response(upstream: UpstreamResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::OK);
    let mut resp = Response::new(Body::from(upstream.body));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    resp
}

pub async fn health_handler() -> Json<serde_json::Value> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    Json(json!({
        "status": "healthy",
        "timestamp": timestamp,
        "endpoints": [
            "POST /dialogflow-proxy",
            "OPTIONS /dialogflow-proxy",
            "GET /health",
        ],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_keeps_status_and_body() {
        let resp = passthrough_response(UpstreamResponse {
            status: 200,
            body: Bytes::from_static(br#"{"fulfillmentText":"hi"}"#),
        });
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn phase_names_are_snake_case() {
        assert_eq!(Phase::Validating.to_string(), "validating");
        assert_eq!(Phase::AcquiringToken.to_string(), "acquiring_token");
        assert_eq!(Phase::Invoking.to_string(), "invoking");
    }
}
