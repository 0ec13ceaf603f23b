use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use dfproxy_core::{CorsConfig, ProxySettings};
use dfproxy_provider::{AgentConfig, UpstreamClientConfig};

#[derive(Parser, Debug)]
#[command(name = "dfproxy", about = "Authenticating proxy for Dialogflow CX detectIntent")]
pub(crate) struct Cli {
    #[arg(long, env = "DFPROXY_HOST", default_value = "127.0.0.1")]
    pub(crate) host: String,
    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub(crate) port: u16,
    #[arg(long, env = "DIALOGFLOW_PROJECT_ID")]
    pub(crate) project_id: String,
    #[arg(long, env = "DIALOGFLOW_AGENT_ID")]
    pub(crate) agent_id: String,
    #[arg(long, env = "DIALOGFLOW_LOCATION", default_value = "global")]
    pub(crate) location: String,
    /// Service account key JSON.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub(crate) credentials: PathBuf,
    #[arg(
        long,
        env = "CORS_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173,http://localhost:3000,http://localhost:3002"
    )]
    pub(crate) allowed_origins: Vec<String>,
    #[arg(long, env = "DIALOGFLOW_LANGUAGE_CODE", default_value = "en")]
    pub(crate) default_language_code: String,
    #[arg(long, env = "DFPROXY_UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub(crate) upstream_timeout_secs: u64,
    /// Fetch a fresh access token for every request.
    #[arg(
        long = "no-token-cache",
        env = "DFPROXY_NO_TOKEN_CACHE",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub(crate) no_token_cache: bool,
    #[arg(long, env = "DIALOGFLOW_API_ENDPOINT")]
    pub(crate) api_endpoint: Option<String>,
    /// Outbound HTTP proxy for token exchange and upstream calls.
    #[arg(long, env = "DFPROXY_OUTBOUND_PROXY")]
    pub(crate) proxy: Option<String>,
}

impl Cli {
    pub(crate) fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn client_config(&self) -> UpstreamClientConfig {
        UpstreamClientConfig {
            proxy: self.proxy.clone(),
            request_timeout: Duration::from_secs(self.upstream_timeout_secs.max(1)),
            ..UpstreamClientConfig::default()
        }
    }

    pub(crate) fn settings(&self) -> ProxySettings {
        let mut agent = AgentConfig::new(
            self.project_id.trim(),
            self.location.trim(),
            self.agent_id.trim(),
        );
        agent.api_endpoint = self.api_endpoint.clone();
        agent.default_language_code = self.default_language_code.trim().to_string();
        ProxySettings {
            agent,
            cors: CorsConfig::with_origins(self.allowed_origins.iter().map(String::as_str)),
        }
    }
}
