use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value as JsonValue;

use crate::credential::AccessToken;
use crate::errors::UpstreamError;
use crate::translate::UpstreamPayload;

/// Raw `detectIntent` result, relayed to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Bytes,
}

pub trait UpstreamClient: Send + Sync {
    /// Single authenticated call, never retried.
    fn invoke<'a>(
        &'a self,
        payload: &'a UpstreamPayload,
        token: &'a AccessToken,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamResponse, UpstreamError>> + Send + 'a>>;
}

#[derive(Clone)]
pub struct WreqUpstreamClient {
    client: wreq::Client,
    timeout: Duration,
}

impl WreqUpstreamClient {
    pub fn new(client: wreq::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn send(
        &self,
        payload: &UpstreamPayload,
        token: &AccessToken,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let body = serde_json::to_vec(&payload.body)
            .map_err(|err| UpstreamError::Transport(err.to_string()))?;
        let resp = self
            .client
            .post(&payload.target_url)
            .header("Authorization", token.authorization())
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| map_wreq_error(err, self.timeout))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|err| map_wreq_error(err, self.timeout))?;
        classify_response(status, body)
    }
}

impl UpstreamClient for WreqUpstreamClient {
    fn invoke<'a>(
        &'a self,
        payload: &'a UpstreamPayload,
        token: &'a AccessToken,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamResponse, UpstreamError>> + Send + 'a>> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.send(payload, token)).await {
                Ok(result) => result,
                Err(_) => Err(UpstreamError::Timeout(self.timeout)),
            }
        })
    }
}

/// Accepts 2xx responses carrying a JSON body; everything else is an error
/// that keeps the upstream's status and body for diagnostics.
pub fn classify_response(status: u16, body: Bytes) -> Result<UpstreamResponse, UpstreamError> {
    if !(200..300).contains(&status) {
        return Err(UpstreamError::Status { status, body });
    }
    if let Err(err) = serde_json::from_slice::<JsonValue>(&body) {
        return Err(UpstreamError::MalformedBody {
            status,
            body,
            message: err.to_string(),
        });
    }
    Ok(UpstreamResponse { status, body })
}

fn map_wreq_error(err: wreq::Error, timeout: Duration) -> UpstreamError {
    if err.is_timeout() {
        return UpstreamError::Timeout(timeout);
    }
    UpstreamError::Transport(err.to_string())
}
