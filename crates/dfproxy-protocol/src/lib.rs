pub mod detect_intent;
pub mod error;

pub use detect_intent::request::{
    ChatQueryInput, ChatRequestBody, ChatTextInput, DetectIntentRequest, QueryInput, TextInput,
};
pub use error::ErrorEnvelope;
