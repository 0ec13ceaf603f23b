use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dfproxy_core::Core;
use dfproxy_provider::{
    CachedTokenSource, ServiceAccountKey, ServiceAccountTokenSource, TokenSource,
    WreqUpstreamClient, build_client,
};
use tracing::info;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("dfproxy failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = cli.settings();
    let client_config = cli.client_config();

    let key = ServiceAccountKey::load(&cli.credentials)?;
    let client = build_client(&client_config)?;
    let exchanger = ServiceAccountTokenSource::new(&key, client.clone())?;
    info!(
        client_email = %exchanger.client_email(),
        key_project = %key.project_id.as_deref().unwrap_or(""),
        token_cache = !cli.no_token_cache,
        "service account loaded"
    );
    let tokens: Arc<dyn TokenSource> = if cli.no_token_cache {
        Arc::new(exchanger)
    } else {
        Arc::new(CachedTokenSource::new(exchanger))
    };
    let upstream = Arc::new(WreqUpstreamClient::new(
        client,
        Duration::from_secs(cli.upstream_timeout_secs.max(1)),
    ));

    info!(
        project = %settings.agent.project_id,
        location = %settings.agent.location,
        agent = %settings.agent.agent_id,
        endpoint = %settings.agent.endpoint(),
        origins = ?settings.cors.allowed_origins,
        "agent configured"
    );
    let core = Core::new(settings, tokens, upstream);
    let app = core.router();

    let bind = cli.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("dfproxy=info,dfproxy_core=info,dfproxy_provider=info")
        });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
