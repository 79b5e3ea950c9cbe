use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use media_resolver::{
    config::Config,
    services::KeepaliveService,
    utils::RemoteFetcher,
    web::{AppState, WebServer, run_until_stopped, wait_for_shutdown_signal},
};

#[derive(Parser)]
#[command(name = "media-resolver")]
#[command(version)]
#[command(about = "Resolves social media post URLs into direct media links and proxies their download")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_logging(cli: &Cli) {
    let log_filter = if cli.log_level == "trace" {
        format!("media_resolver={},tower_http=trace", cli.log_level)
    } else {
        format!("media_resolver={}", cli.log_level)
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    info!("Starting Media Resolver v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let fetcher = RemoteFetcher::new(&config.upstream)?;
    let keepalive = match config.keepalive.target() {
        Some(target) => Some(KeepaliveService::new(
            fetcher.clone(),
            target,
            config.keepalive.interval()?,
        )),
        None => {
            info!("Keepalive disabled (no self URL configured)");
            None
        }
    };

    let web_server = WebServer::new(AppState::new(config, fetcher))?;
    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );

    let shutdown = CancellationToken::new();
    let (server_ready_tx, server_ready_rx) = tokio::sync::oneshot::channel();

    let server_token = shutdown.clone();
    let server_handle = tokio::spawn(async move {
        web_server
            .serve_with_cancellation(server_ready_tx, Some(server_token))
            .await
    });

    match server_ready_rx.await {
        Ok(Ok(())) => info!("Web server is now listening"),
        Ok(Err(bind_error)) => {
            error!("Failed to bind web server: {}", bind_error);
            return Err(bind_error);
        }
        Err(_) => {
            error!("Web server task completed without signaling");
            return Err(anyhow::anyhow!("Web server failed to start"));
        }
    }

    let keepalive_handle = keepalive.map(|service| service.spawn(shutdown.clone()));

    let result = run_until_stopped(server_handle, wait_for_shutdown_signal(), shutdown).await;

    if let Some(handle) = keepalive_handle {
        let _ = handle.await;
    }
    result?;

    info!("Media Resolver stopped");
    Ok(())
}
