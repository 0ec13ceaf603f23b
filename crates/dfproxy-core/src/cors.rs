use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
};
use http::{HeaderMap, HeaderValue, Method};

const ANY_ORIGIN: &str = "*";

/// Allow-list driven CORS policy. It is the proxy's only access control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_methods: String,
    pub allow_headers: String,
    pub max_age_secs: u32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
                "http://localhost:3002".to_string(),
            ],
            allow_methods: "POST, OPTIONS".to_string(),
            allow_headers: "Content-Type, Authorization".to_string(),
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    pub fn with_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: origins
                .into_iter()
                .map(Into::into)
                .map(|origin| normalize_origin(&origin).to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            ..Self::default()
        }
    }

    /// Value for `Access-Control-Allow-Origin`.
    ///
    /// An allowed request origin is echoed back. Anything else gets the first
    /// configured origin, which the browser will not match.
    pub fn allow_origin(&self, request_origin: Option<&str>) -> Option<String> {
        if self.allowed_origins.iter().any(|origin| origin == ANY_ORIGIN) {
            return Some(ANY_ORIGIN.to_string());
        }
        if let Some(origin) = request_origin.map(normalize_origin)
            && self.allowed_origins.iter().any(|allowed| allowed == origin)
        {
            return Some(origin.to_string());
        }
        self.allowed_origins.first().cloned()
    }

    pub fn apply(&self, request_origin: Option<&str>, preflight: bool, headers: &mut HeaderMap) {
        if let Some(origin) = self
            .allow_origin(request_origin)
            .and_then(|origin| HeaderValue::from_str(&origin).ok())
        {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        if let Ok(methods) = HeaderValue::from_str(&self.allow_methods) {
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, methods);
        }
        if let Ok(allow_headers) = HeaderValue::from_str(&self.allow_headers) {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
        }
        headers.append(VARY, HeaderValue::from_static("Origin"));
        if preflight {
            headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.max_age_secs));
        }
    }
}

fn normalize_origin(origin: &str) -> &str {
    origin.trim().trim_end_matches('/')
}

pub async fn cors_middleware(
    State(cors): State<Arc<CorsConfig>>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let preflight = req.method() == Method::OPTIONS;
    let mut resp = next.run(req).await;
    cors.apply(origin.as_deref(), preflight, resp.headers_mut());
    resp
}
