use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use dfproxy_provider::{AgentConfig, TokenSource, UpstreamClient};

use crate::cors::{CorsConfig, cors_middleware};
use crate::handler::{health_handler, preflight_handler, proxy_handler};

pub const PROXY_PATH: &str = "/dialogflow-proxy";
pub const HEALTH_PATH: &str = "/health";

/// Immutable settings built once at startup.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub agent: AgentConfig,
    pub cors: CorsConfig,
}

pub struct CoreState {
    pub settings: Arc<ProxySettings>,
    pub tokens: Arc<dyn TokenSource>,
    pub upstream: Arc<dyn UpstreamClient>,
}

pub struct Core {
    state: Arc<CoreState>,
}

impl Core {
    pub fn new(
        settings: ProxySettings,
        tokens: Arc<dyn TokenSource>,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            state: Arc::new(CoreState {
                settings: Arc::new(settings),
                tokens,
                upstream,
            }),
        }
    }

    pub fn router(&self) -> Router {
        let cors = Arc::new(self.state.settings.cors.clone());
        Router::new()
            .route(
                PROXY_PATH,
                post(proxy_handler).options(preflight_handler),
            )
            .route(HEALTH_PATH, get(health_handler))
            .with_state(self.state.clone())
            .layer(middleware::from_fn_with_state(cors, cors_middleware))
    }
}
