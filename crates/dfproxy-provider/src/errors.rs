use std::time::Duration;

use bytes::Bytes;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Failure to obtain a bearer token for the service account.
///
/// Every variant is reported to the caller the same way; the split only
/// exists so the server log tells a broken key file apart from an
/// unreachable or refusing identity provider.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to read service account key {path}: {message}")]
    KeyUnreadable { path: String, message: String },
    #[error("malformed service account key: {0}")]
    MalformedKey(String),
    #[error("token exchange failed: {0}")]
    Exchange(String),
    #[error("token exchange rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("token response did not contain an access token")]
    MissingAccessToken,
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("upstream responded with status {status}")]
    Status { status: u16, body: Bytes },
    #[error("upstream returned malformed JSON with status {status}: {message}")]
    MalformedBody {
        status: u16,
        body: Bytes,
        message: String,
    },
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } | UpstreamError::MalformedBody { status, .. } => {
                Some(*status)
            }
            UpstreamError::Timeout(_) | UpstreamError::Transport(_) => None,
        }
    }

    /// Upstream's own error payload when it sent one, its raw text when that
    /// is not JSON, otherwise the error message.
    pub fn details(&self) -> JsonValue {
        match self {
            UpstreamError::Status { body, .. } | UpstreamError::MalformedBody { body, .. } => {
                body_details(body).unwrap_or_else(|| JsonValue::String(self.to_string()))
            }
            UpstreamError::Timeout(_) | UpstreamError::Transport(_) => {
                JsonValue::String(self.to_string())
            }
        }
    }
}

fn body_details(body: &Bytes) -> Option<JsonValue> {
    if body.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_slice::<JsonValue>(body) {
        return Some(value);
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        return None;
    }
    Some(JsonValue::String(text))
}
