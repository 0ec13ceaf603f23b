use std::time::Duration;

use wreq::{Client, Proxy};

#[derive(Debug, Clone)]
pub struct UpstreamClientConfig {
    /// Optional outbound proxy for token exchange and upstream calls.
    pub proxy: Option<String>,
    pub connect_timeout: Duration,
    /// Upper bound for one `detectIntent` call, headers and body included.
    pub request_timeout: Duration,
}

impl Default for UpstreamClientConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub fn build_client(config: &UpstreamClientConfig) -> Result<Client, wreq::Error> {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout);

    if let Some(proxy) = normalize_proxy(config.proxy.as_deref()) {
        builder = builder.proxy(Proxy::all(proxy)?);
    }

    builder.build()
}

fn normalize_proxy(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|item| !item.is_empty())
}
