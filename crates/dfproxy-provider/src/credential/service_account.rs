use std::fmt;
use std::path::Path;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{AccessToken, DEFAULT_SCOPE, DEFAULT_TOKEN_URI, TokenSource};
use crate::errors::CredentialError;

const ASSERTION_LIFETIME_SECS: i64 = 3600;
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Google service account JSON fields needed for the JWT-bearer grant.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|err| CredentialError::KeyUnreadable {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &[u8]) -> Result<Self, CredentialError> {
        let key: ServiceAccountKey = serde_json::from_slice(raw)
            .map_err(|err| CredentialError::MalformedKey(err.to_string()))?;
        if key.client_email.trim().is_empty() {
            return Err(CredentialError::MalformedKey(
                "client_email is empty".to_string(),
            ));
        }
        if key.private_key.trim().is_empty() {
            return Err(CredentialError::MalformedKey(
                "private_key is empty".to_string(),
            ));
        }
        Ok(key)
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges a signed service-account assertion for an OAuth access token.
/// Every call performs a fresh exchange.
pub struct ServiceAccountTokenSource {
    client_email: String,
    key_id: String,
    token_uri: String,
    scope: String,
    signing_key: EncodingKey,
    client: wreq::Client,
}

impl ServiceAccountTokenSource {
    /// Fails when the private key is not a usable RSA PEM, so a broken key
    /// file is caught before the server starts listening.
    pub fn new(key: &ServiceAccountKey, client: wreq::Client) -> Result<Self, CredentialError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|err| CredentialError::MalformedKey(err.to_string()))?;
        Ok(Self {
            client_email: key.client_email.clone(),
            key_id: key.private_key_id.trim().to_string(),
            token_uri: key.token_uri().to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            signing_key,
            client,
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    fn assertion(&self, now: i64) -> Result<String, CredentialError> {
        let claims = JwtClaims {
            iss: &self.client_email,
            scope: &self.scope,
            aud: &self.token_uri,
            exp: now + ASSERTION_LIFETIME_SECS,
            iat: now,
        };
        let mut header = Header::new(Algorithm::RS256);
        if !self.key_id.is_empty() {
            header.kid = Some(self.key_id.clone());
        }
        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|err| CredentialError::MalformedKey(err.to_string()))
    }
}

#[async_trait::async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<AccessToken, CredentialError> {
        let now = OffsetDateTime::now_utc();
        let jwt = self.assertion(now.unix_timestamp())?;
        let body = format!(
            "grant_type=urn:ietf:params:oauth:grant-type:jwt-bearer&assertion={}",
            urlencoding::encode(&jwt)
        );

        let resp = self
            .client
            .post(&self.token_uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|err| CredentialError::Exchange(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return Err(CredentialError::Rejected {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        let body = resp
            .bytes()
            .await
            .map_err(|err| CredentialError::Exchange(err.to_string()))?;
        let token_resp: OAuthTokenResponse = serde_json::from_slice(&body)
            .map_err(|err| CredentialError::Exchange(format!("invalid token response: {err}")))?;
        let token = token_resp
            .access_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(CredentialError::MissingAccessToken)?;
        let expires_in = token_resp
            .expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = now
            .checked_add(time::Duration::seconds(expires_in))
            .ok_or_else(|| {
                CredentialError::Exchange(format!("token lifetime out of range: {expires_in}s"))
            })?;
        Ok(AccessToken::new(token, expires_at))
    }
}
