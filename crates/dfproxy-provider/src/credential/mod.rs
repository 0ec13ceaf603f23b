use std::fmt;
use std::time::Duration;

use time::OffsetDateTime;

use crate::errors::CredentialError;

mod cache;
mod service_account;

pub use cache::CachedTokenSource;
pub use service_account::{ServiceAccountKey, ServiceAccountTokenSource};

pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Short-lived bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    expires_at: OffsetDateTime,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// True when the token is still valid for at least `margin` after `now`.
    pub fn valid_for(&self, now: OffsetDateTime, margin: Duration) -> bool {
        now + margin < self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, CredentialError>;

    /// Drops any cached token so the next call exchanges a fresh one.
    fn invalidate(&self) {}
}
