//! Quorum CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quorum")]
#[command(about = "Fan one question out to several LLM providers and let a judge rank the answers")]
struct Cli {
    /// Address to bind the HTTP API (overrides QUORUM_BIND)
    #[arg(short, long)]
    bind: Option<std::net::SocketAddr>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Quorum...");

    let mut config = quorum::config::Config::load()
        .with_context(|| "failed to load configuration from environment")?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    tracing::info!(data_dir = %config.data_dir.display(), "Configuration loaded");

    let store = quorum::store::ResultStore::open(&config.store_path())
        .with_context(|| "failed to open document store")?;

    let dispatcher =
        quorum::dispatch::Dispatcher::new(quorum::providers::ProviderRegistry::new());
    let analyzer = quorum::analyzer::Analyzer::new(config.llm.judge.clone())
        .with_context(|| "failed to initialize analyzer")?;

    let bind = config.bind;
    let state = Arc::new(quorum::api::ApiState {
        config,
        store,
        dispatcher,
        analyzer,
        started_at: std::time::Instant::now(),
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let server = quorum::api::start_http_server(bind, state, shutdown_rx)
        .await
        .with_context(|| "failed to start HTTP server")?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    let _ = server.await;

    tracing::info!("Quorum stopped");
    Ok(())
}
