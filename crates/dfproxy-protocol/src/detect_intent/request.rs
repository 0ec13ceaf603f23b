use serde::{Deserialize, Serialize};

/// Simplified chat body posted by the browser client.
///
/// Every field is optional on the wire so that a missing field is reported by
/// name instead of failing deserialization as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_input: Option<ChatQueryInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQueryInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<ChatTextInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTextInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ChatRequestBody {
    pub fn utterance(&self) -> Option<&str> {
        self.query_input
            .as_ref()
            .and_then(|input| input.text.as_ref())
            .and_then(|text| text.text.as_deref())
    }

    pub fn language_code(&self) -> Option<&str> {
        self.query_input
            .as_ref()
            .and_then(|input| input.language_code.as_deref())
    }
}

/// Body of `sessions/{session}:detectIntent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectIntentRequest {
    pub query_input: QueryInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInput {
    pub text: TextInput,
    pub language_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    pub text: String,
}
