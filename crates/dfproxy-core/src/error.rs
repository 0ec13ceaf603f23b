use axum::body::Body;
use axum::response::{IntoResponse, Response};
use dfproxy_protocol::ErrorEnvelope;
use dfproxy_provider::{CredentialError, UpstreamError, ValidationError};
use http::StatusCode;
use http::header::CONTENT_TYPE;
use serde_json::Value as JsonValue;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error in proxy";
pub const INVALID_BODY_MESSAGE: &str = "Invalid JSON body";

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidBody(_) | ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::Credential(_) | ProxyError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            ProxyError::InvalidBody(message) => ErrorEnvelope::new(INVALID_BODY_MESSAGE)
                .with_details(JsonValue::String(message.clone())),
            ProxyError::Validation(err) => ErrorEnvelope::new(err.to_string()),
            ProxyError::Credential(err) => ErrorEnvelope::new(INTERNAL_ERROR_MESSAGE)
                .with_details(JsonValue::String(err.to_string())),
            ProxyError::Upstream(err) => {
                ErrorEnvelope::new(INTERNAL_ERROR_MESSAGE).with_details(err.details())
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut resp = Response::new(Body::from(self.envelope().to_bytes()));
        *resp.status_mut() = self.status();
        resp.headers_mut().insert(
            CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        resp
    }
}
