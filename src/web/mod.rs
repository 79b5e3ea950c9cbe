//! Web layer
//!
//! The HTTP interface of the resolver. Handlers are thin and delegate to the
//! service layer; errors are mapped to responses once, in [`responses`].
//!
//! Routes:
//! - `GET  /api/resolve/rednote?url=` resolve a post page into media links
//! - `GET  /api/download?url=&filename=&referer=` stream a media file
//! - `POST /api/head` probe a URL's content type
//! - `GET  /api/og?url=` read a page's preview title and image
//! - `GET  /health` liveness
//!
//! Anything else falls through to the static frontend when one is configured.

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::{error, info, warn};

use crate::{
    config::Config,
    errors::AppResult,
    services::{DownloadService, MetadataService, ProbeService, ResolverService},
    utils::RemoteFetcher,
};

pub mod handlers;
pub mod middleware;
pub mod responses;

/// Shared, immutable state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Arc<ResolverService>,
    pub download: Arc<DownloadService>,
    pub probe: Arc<ProbeService>,
    pub metadata: Arc<MetadataService>,
}

impl AppState {
    /// Build every service around one shared fetcher
    pub fn new(config: Config, fetcher: RemoteFetcher) -> Self {
        let download = DownloadService::new(
            fetcher.clone(),
            config.download.default_filename.clone(),
            config.download.enforce_media_gate,
        );

        Self {
            resolver: Arc::new(ResolverService::new(fetcher.clone())),
            download: Arc::new(download),
            probe: Arc::new(ProbeService::new(fetcher.clone())),
            metadata: Arc::new(MetadataService::new(fetcher)),
            config: Arc::new(config),
        }
    }

    /// Build the fetcher from `config.upstream`, then the services
    pub fn from_config(config: Config) -> AppResult<Self> {
        let fetcher = RemoteFetcher::new(&config.upstream)?;
        Ok(Self::new(config, fetcher))
    }
}

/// Assemble the router with middleware and the optional static fallback
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/resolve/rednote", get(handlers::resolve::resolve_post))
        .route("/api/download", get(handlers::download::download_media))
        .route("/api/head", post(handlers::probe::probe_url))
        .route("/api/og", get(handlers::metadata::page_metadata))
        .route("/health", get(handlers::health::health_check));

    let app = match state.config.web.static_dir.as_deref() {
        Some(dir) if dir.is_dir() => {
            info!(static_dir = %dir.display(), "Serving static frontend");
            api.fallback_service(ServeDir::new(dir))
        }
        Some(dir) => {
            warn!(static_dir = %dir.display(), "Static directory not found, frontend disabled");
            api
        }
        None => api,
    };

    app.layer(axum::middleware::from_fn(
        middleware::security_headers_middleware,
    ))
    .layer(axum::middleware::from_fn(
        middleware::request_logging_middleware,
    ))
    .layer(CorsLayer::permissive())
    .with_state(state)
}

pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(state: AppState) -> Result<Self> {
        let addr: SocketAddr =
            format!("{}:{}", state.config.web.host, state.config.web.port).parse()?;
        Ok(Self {
            app: create_router(state),
            addr,
        })
    }

    /// Serve with cancellation support and ready notification
    pub async fn serve_with_cancellation(
        self,
        ready_signal: tokio::sync::oneshot::Sender<Result<()>>,
        cancellation_token: Option<CancellationToken>,
    ) -> Result<()> {
        let listener = match tokio::net::TcpListener::bind(&self.addr).await {
            Ok(listener) => listener,
            Err(e) => {
                let message = format!("Failed to bind to {}: {}", self.addr, e);
                let _ = ready_signal.send(Err(anyhow::anyhow!("{}", message)));
                return Err(anyhow::anyhow!(message));
            }
        };

        info!("Web server listening on http://{}", self.addr);
        let _ = ready_signal.send(Ok(()));

        let shutdown_signal = async move {
            match cancellation_token {
                Some(token) => {
                    token.cancelled().await;
                    info!("Web server received cancellation signal, shutting down gracefully");
                }
                None => wait_for_shutdown_signal().await,
            }
        };

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal)
            .await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Wait for `signal` or for the server task to end on its own, whichever
/// comes first, then cancel `shutdown` and return the server's outcome.
pub async fn run_until_stopped(
    mut server: JoinHandle<Result<()>>,
    signal: impl Future<Output = ()>,
    shutdown: CancellationToken,
) -> Result<()> {
    let finished = tokio::select! {
        _ = signal => None,
        result = &mut server => {
            error!("Web server stopped unexpectedly");
            Some(result)
        }
    };
    shutdown.cancel();

    let result = match finished {
        Some(result) => result,
        None => server.await,
    };
    result?
}

/// Resolve on SIGTERM or SIGINT (Ctrl+C elsewhere)
pub async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                    _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
                }
            }
            _ => {
                warn!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down gracefully");
    }
}
