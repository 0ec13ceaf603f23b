pub mod agent;
pub mod credential;
pub mod errors;
pub mod http_client;
pub mod translate;
pub mod upstream;

pub use agent::AgentConfig;
pub use credential::{
    AccessToken, CachedTokenSource, ServiceAccountKey, ServiceAccountTokenSource, TokenSource,
};
pub use errors::{CredentialError, UpstreamError, ValidationError};
pub use http_client::{UpstreamClientConfig, build_client};
pub use translate::{InboundChatRequest, UpstreamPayload, translate};
pub use upstream::{UpstreamClient, UpstreamResponse, WreqUpstreamClient};
