use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use serde_json::{Value, json};
use time::OffsetDateTime;

use dfproxy_provider::{
    CachedTokenSource, CredentialError, ServiceAccountKey, ServiceAccountTokenSource, TokenSource,
    UpstreamClientConfig, build_client,
};

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/service-account.json"
);

#[derive(Clone)]
struct FakeTokenEndpoint {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<String>>>,
}

async fn token(State(state): State<FakeTokenEndpoint>, body: String) -> (StatusCode, Json<Value>) {
    state.seen.lock().unwrap().push(body);
    (state.status, Json(state.reply.clone()))
}

async fn spawn_token_endpoint(state: FakeTokenEndpoint) -> String {
    let app = Router::new().route("/token", post(token)).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/token")
}

fn endpoint(status: StatusCode, reply: Value) -> FakeTokenEndpoint {
    FakeTokenEndpoint {
        status,
        reply,
        seen: Arc::new(Mutex::new(Vec::new())),
    }
}

async fn token_source(token_uri: String) -> ServiceAccountTokenSource {
    let mut key = ServiceAccountKey::load(FIXTURE).unwrap();
    key.token_uri = Some(token_uri);
    let client = build_client(&UpstreamClientConfig::default()).unwrap();
    ServiceAccountTokenSource::new(&key, client).unwrap()
}

fn form_value<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    body.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == name).then_some(v)
    })
}

#[tokio::test]
async fn exchanges_signed_assertion_for_access_token() {
    let state = endpoint(
        StatusCode::OK,
        json!({"access_token": "ya29.fake", "expires_in": 1800, "token_type": "Bearer"}),
    );
    let seen = state.seen.clone();
    let source = token_source(spawn_token_endpoint(state).await).await;

    let before = OffsetDateTime::now_utc();
    let token = source.access_token().await.unwrap();
    assert_eq!(token.secret(), "ya29.fake");
    assert!(token.valid_for(before, Duration::from_secs(1700)));
    assert!(!token.valid_for(before, Duration::from_secs(1900)));

    let bodies = seen.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        form_value(&bodies[0], "grant_type"),
        Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    );
    let assertion = form_value(&bodies[0], "assertion").unwrap();
    let header = jsonwebtoken::decode_header(assertion).unwrap();
    assert_eq!(header.alg, jsonwebtoken::Algorithm::RS256);
    assert_eq!(header.kid.as_deref(), Some("test-key-1"));
}

#[tokio::test]
async fn rejected_exchange_is_a_credential_error() {
    let state = endpoint(
        StatusCode::BAD_REQUEST,
        json!({"error": "invalid_grant", "error_description": "Invalid JWT Signature."}),
    );
    let source = token_source(spawn_token_endpoint(state).await).await;

    let err = source.access_token().await.unwrap_err();
    match err {
        CredentialError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn response_without_token_is_a_credential_error() {
    let state = endpoint(StatusCode::OK, json!({"id_token": "not-what-we-asked-for"}));
    let source = token_source(spawn_token_endpoint(state).await).await;

    let err = source.access_token().await.unwrap_err();
    assert!(matches!(err, CredentialError::MissingAccessToken));
}

#[tokio::test]
async fn out_of_range_lifetime_is_a_credential_error() {
    let state = endpoint(
        StatusCode::OK,
        json!({"access_token": "ya29.forever", "expires_in": i64::MAX}),
    );
    let source = token_source(spawn_token_endpoint(state).await).await;

    let err = source.access_token().await.unwrap_err();
    match err {
        CredentialError::Exchange(message) => assert!(message.contains("out of range")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_identity_provider_is_a_credential_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let source = token_source(format!("http://{addr}/token")).await;

    let err = source.access_token().await.unwrap_err();
    assert!(matches!(err, CredentialError::Exchange(_)));
}

#[tokio::test]
async fn cache_reuses_exchanged_token() {
    let state = endpoint(
        StatusCode::OK,
        json!({"access_token": "ya29.cached", "expires_in": 3600}),
    );
    let seen = state.seen.clone();
    let source = CachedTokenSource::new(token_source(spawn_token_endpoint(state).await).await);

    for _ in 0..3 {
        assert_eq!(source.access_token().await.unwrap().secret(), "ya29.cached");
    }
    assert_eq!(seen.lock().unwrap().len(), 1);

    source.invalidate();
    source.access_token().await.unwrap();
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn missing_key_file_fails_to_load() {
    let err = ServiceAccountKey::load("/nonexistent/service-account-key.json").unwrap_err();
    assert!(matches!(err, CredentialError::KeyUnreadable { .. }));
}
