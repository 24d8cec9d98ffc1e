use crate::catalog::{CatalogResolver, EpgClient};
use crate::config::{Config, ServerConfig};
use crate::streaming::SessionManager;
use crate::worker::{ProcessLauncher, WorkerLauncher, WorkerSupervisor};
use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod routes_files;
pub mod routes_rtp;
pub mod routes_sessions;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Catalog lookups; the HTTP client inside is shared by all requests
    pub catalog: Arc<dyn CatalogResolver>,
    /// Starts workers and probes their readiness
    pub supervisor: Arc<WorkerSupervisor>,
    /// Live stream sessions
    pub sessions: SessionManager,
}

impl AppContext {
    /// Build a context talking to the configured catalog service and
    /// launching the configured worker executable.
    pub fn new(config: Config) -> Self {
        let catalog = Arc::new(EpgClient::new(&config.catalog));
        let launcher = Arc::new(ProcessLauncher::new(&config.worker));
        Self::with_components(config, catalog, launcher)
    }

    /// Build a context from explicit collaborators.
    pub fn with_components(
        config: Config,
        catalog: Arc<dyn CatalogResolver>,
        launcher: Arc<dyn WorkerLauncher>,
    ) -> Self {
        let supervisor = Arc::new(WorkerSupervisor::new(
            launcher,
            config.worker.readiness_window(),
        ));

        Self {
            config: Arc::new(config),
            catalog,
            supervisor,
            sessions: SessionManager::new(),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/channels.m3u", get(routes_files::channels))
        .route("/MovistarTV.m3u", get(routes_files::channels))
        .route("/guide.xml", get(routes_files::guide))
        .route("/sessions", get(routes_sessions::list_sessions))
        .route(
            "/rtp/{channel_id}/{channel_key}/{token}",
            get(routes_rtp::handle_rtp),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server and run until a shutdown signal arrives
pub async fn start_server(config: Config) -> Result<()> {
    let listener = bind_listener(&config.server).await?;
    tracing::info!("Starting server on {}", listener.local_addr()?);

    let ctx = AppContext::new(config);

    let sessions = ctx.sessions.clone();
    serve(listener, ctx, shutdown_signal(sessions)).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Bind the HTTP listener. `host` may be an IP address or a hostname.
pub async fn bind_listener(server: &ServerConfig) -> Result<TcpListener> {
    TcpListener::bind((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", server.host, server.port))
}

/// Serve `ctx` on an already bound listener until `shutdown` resolves.
///
/// Peer addresses are recorded so handlers can pass the client IP to workers.
pub async fn serve<F>(listener: TcpListener, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then stop every live stream so the
/// connections can drain.
async fn shutdown_signal(sessions: SessionManager) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    sessions.shutdown();
}
