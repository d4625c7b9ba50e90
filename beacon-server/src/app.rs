use crate::config::ServerConfig;
use crate::rendezvous::RendezvousServer;
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use beacon_core::DirectorySnapshot;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Start the rendezvous loop on the current runtime and return the service
/// that feeds it.
pub fn spawn_rendezvous(config: &ServerConfig) -> SignalingService {
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_capacity);
    let service = SignalingService::new(cmd_tx);

    let server = RendezvousServer::new(cmd_rx, Arc::new(service.clone()))
        .with_coalesce_limit(config.coalesce_limit);
    tokio::spawn(server.run());

    service
}

/// HTTP surface: the WebSocket endpoint plus the operator routes.
pub fn router(service: SignalingService) -> Router {
    // Browser clients are served from other origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/directory", get(directory_handler))
        .route("/admin/clear", post(clear_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

/// Bind `config.addr` and serve until `shutdown` resolves.
pub async fn serve<F>(config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    serve_on(listener, &config, shutdown).await
}

/// Serve on an already bound listener.
pub async fn serve_on<F>(listener: TcpListener, config: &ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let service = spawn_rendezvous(config);
    let app = router(service);

    info!(
        "Signalling server listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("signalling server failed")
}

async fn directory_handler(
    State(service): State<SignalingService>,
) -> Result<Json<DirectorySnapshot>, StatusCode> {
    service.directory().await.map(Json).map_err(|e| {
        error!("Directory request failed: {:#}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })
}

async fn clear_handler(State(service): State<SignalingService>) -> StatusCode {
    match service.clear_directory().await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            error!("Directory reset failed: {:#}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
