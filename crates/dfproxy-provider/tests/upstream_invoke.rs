use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use serde_json::{Value, json};
use time::OffsetDateTime;

use dfproxy_provider::{
    AccessToken, AgentConfig, InboundChatRequest, UpstreamClient, UpstreamClientConfig,
    UpstreamError, WreqUpstreamClient, build_client, translate,
};

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct FakeAgent {
    status: StatusCode,
    reply: &'static str,
    delay: Duration,
    seen: Arc<Mutex<Option<Seen>>>,
}

async fn detect_intent(
    State(state): State<FakeAgent>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(&'static str, &'static str); 1], &'static str) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    *state.seen.lock().unwrap() = Some(Seen {
        path: uri.path().to_string(),
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });
    tokio::time::sleep(state.delay).await;
    (
        state.status,
        [("content-type", "application/json")],
        state.reply,
    )
}

async fn spawn_agent(state: FakeAgent) -> String {
    let app = Router::new().fallback(detect_intent).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn fake_agent(status: StatusCode, reply: &'static str) -> FakeAgent {
    FakeAgent {
        status,
        reply,
        delay: Duration::ZERO,
        seen: Arc::new(Mutex::new(None)),
    }
}

fn agent_config(endpoint: String) -> AgentConfig {
    let mut agent = AgentConfig::new("healthcare-patient-portal", "global", "agent-42");
    agent.api_endpoint = Some(endpoint);
    agent
}

fn invoker(timeout: Duration) -> WreqUpstreamClient {
    let config = UpstreamClientConfig {
        request_timeout: timeout,
        ..UpstreamClientConfig::default()
    };
    WreqUpstreamClient::new(build_client(&config).unwrap(), timeout)
}

fn token() -> AccessToken {
    AccessToken::new(
        "ya29.upstream",
        OffsetDateTime::now_utc() + Duration::from_secs(3600),
    )
}

#[tokio::test]
async fn success_is_returned_verbatim() {
    let state = fake_agent(StatusCode::OK, r#"{"fulfillmentText":"hi"}"#);
    let seen = state.seen.clone();
    let agent = agent_config(spawn_agent(state).await);
    let payload = translate(&InboundChatRequest::new("abc123", "hello"), &agent).unwrap();

    let resp = invoker(Duration::from_secs(5))
        .invoke(&payload, &token())
        .await
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body.as_ref(), br#"{"fulfillmentText":"hi"}"#);

    let seen = seen.lock().unwrap().clone().unwrap();
    assert_eq!(
        seen.path,
        "/v3/projects/healthcare-patient-portal/locations/global/agents/agent-42/sessions/abc123:detectIntent"
    );
    assert_eq!(seen.authorization.as_deref(), Some("Bearer ya29.upstream"));
    assert_eq!(seen.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        seen.body,
        json!({"queryInput": {"text": {"text": "hello"}, "languageCode": "en"}})
    );
}

#[tokio::test]
async fn non_success_status_carries_upstream_payload() {
    let state = fake_agent(StatusCode::FORBIDDEN, r#"{"error":"permission denied"}"#);
    let agent = agent_config(spawn_agent(state).await);
    let payload = translate(&InboundChatRequest::new("abc123", "hello"), &agent).unwrap();

    let err = invoker(Duration::from_secs(5))
        .invoke(&payload, &token())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.details(), json!({"error": "permission denied"}));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let mut state = fake_agent(StatusCode::OK, r#"{}"#);
    state.delay = Duration::from_secs(2);
    let agent = agent_config(spawn_agent(state).await);
    let payload = translate(&InboundChatRequest::new("abc123", "hello"), &agent).unwrap();

    let err = invoker(Duration::from_millis(200))
        .invoke(&payload, &token())
        .await
        .unwrap_err();
    assert!(matches!(err, UpstreamError::Timeout(_)));
}

#[tokio::test]
async fn connection_failure_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let agent = agent_config(format!("http://{addr}"));
    let payload = translate(&InboundChatRequest::new("abc123", "hello"), &agent).unwrap();

    let err = invoker(Duration::from_secs(5))
        .invoke(&payload, &token())
        .await
        .unwrap_err();
    assert!(matches!(err, UpstreamError::Transport(_)));
    assert_eq!(err.status(), None);
}
