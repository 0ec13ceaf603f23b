use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// JSON error body returned by the proxy: `{ "error": ..., "details": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    pub fn to_bytes(&self) -> Bytes {
        // Only strings and already-parsed JSON values end up in here.
        serde_json::to_vec(self)
            .map(Bytes::from)
            .unwrap_or_else(|_| Bytes::from_static(b"{\"error\":\"internal error\"}"))
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorEnvelope;

    #[test]
    fn details_are_omitted_when_absent() {
        let body = ErrorEnvelope::new("Missing required field: sessionId").to_bytes();
        assert_eq!(
            body.as_ref(),
            br#"{"error":"Missing required field: sessionId"}"#
        );
    }

    #[test]
    fn details_keep_upstream_payload() {
        let envelope = ErrorEnvelope::new("Internal server error in proxy")
            .with_details(serde_json::json!({"error": "permission denied"}));
        let value: serde_json::Value = serde_json::from_slice(&envelope.to_bytes()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "error": "Internal server error in proxy",
                "details": {"error": "permission denied"}
            })
        );
    }
}
