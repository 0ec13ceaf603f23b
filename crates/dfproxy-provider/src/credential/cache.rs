use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use super::{AccessToken, TokenSource};
use crate::errors::CredentialError;

const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Process-wide token cache in front of another [`TokenSource`].
///
/// Readers load the current token through an atomic swap. Refreshes are
/// serialized so a burst of requests on an expired token runs one exchange.
pub struct CachedTokenSource<S> {
    inner: S,
    current: ArcSwapOption<AccessToken>,
    refresh: Mutex<()>,
    margin: Duration,
}

impl<S: TokenSource> CachedTokenSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_margin(inner, DEFAULT_REFRESH_MARGIN)
    }

    pub fn with_margin(inner: S, margin: Duration) -> Self {
        Self {
            inner,
            current: ArcSwapOption::empty(),
            refresh: Mutex::new(()),
            margin,
        }
    }

    fn cached(&self) -> Option<AccessToken> {
        let now = OffsetDateTime::now_utc();
        self.current
            .load_full()
            .filter(|token| token.valid_for(now, self.margin))
            .map(|token| AccessToken::clone(&token))
    }
}

#[async_trait::async_trait]
impl<S: TokenSource> TokenSource for CachedTokenSource<S> {
    async fn access_token(&self) -> Result<AccessToken, CredentialError> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }
        let _guard = self.refresh.lock().await;
        if let Some(token) = self.cached() {
            return Ok(token);
        }
        let token = self.inner.access_token().await?;
        tracing::debug!(expires_at = %token.expires_at(), "access token refreshed");
        self.current.store(Some(Arc::new(token.clone())));
        Ok(token)
    }

    fn invalidate(&self) {
        self.current.store(None);
        self.inner.invalidate();
    }
}
