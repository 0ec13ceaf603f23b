use dfproxy_protocol::{ChatRequestBody, DetectIntentRequest, QueryInput, TextInput};

use crate::agent::AgentConfig;
use crate::errors::ValidationError;

pub const FIELD_SESSION_ID: &str = "sessionId";
pub const FIELD_UTTERANCE: &str = "queryInput.text.text";

/// Validated chat request from the browser client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundChatRequest {
    pub session_id: String,
    pub utterance_text: String,
    /// `None` falls back to [`AgentConfig::default_language_code`].
    pub language_code: Option<String>,
}

impl InboundChatRequest {
    pub fn new(session_id: impl Into<String>, utterance_text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            utterance_text: utterance_text.into(),
            language_code: None,
        }
    }

    pub fn from_body(body: ChatRequestBody) -> Result<Self, ValidationError> {
        let utterance = body.utterance().map(str::to_string);
        let language_code = body
            .language_code()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let request = Self {
            session_id: body.session_id.unwrap_or_default(),
            utterance_text: utterance.unwrap_or_default(),
            language_code,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_id.trim().is_empty() {
            return Err(ValidationError::MissingField(FIELD_SESSION_ID));
        }
        if self.utterance_text.trim().is_empty() {
            return Err(ValidationError::MissingField(FIELD_UTTERANCE));
        }
        Ok(())
    }
}

/// A ready-to-send `detectIntent` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamPayload {
    pub target_url: String,
    pub body: DetectIntentRequest,
}

pub fn translate(
    request: &InboundChatRequest,
    agent: &AgentConfig,
) -> Result<UpstreamPayload, ValidationError> {
    request.validate()?;
    let language_code = request
        .language_code
        .clone()
        .unwrap_or_else(|| agent.default_language_code.clone());
    Ok(UpstreamPayload {
        target_url: agent.detect_intent_url(&request.session_id),
        body: DetectIntentRequest {
            query_input: QueryInput {
                text: TextInput {
                    text: request.utterance_text.clone(),
                },
                language_code,
            },
        },
    })
}
