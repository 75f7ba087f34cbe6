//! HTTP façade: video info, download relay, and the static UI.

mod error;
mod relay;
mod routes;
mod state;

pub use state::AppState;

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

/// Builds the router.
///
/// - `POST /api/video-info` - metadata and curated formats for a URL
/// - `GET /api/download` - streams one format as an attachment
/// - `GET /api/health` - extractor readiness
/// - anything else - files from the static UI directory (`/` is `index.html`)
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/api/video-info", post(routes::video_info))
        .route("/api/download", get(routes::download))
        .route("/api/health", get(routes::health))
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = create_router(state, config);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    info!(
        "✅ Server running on http://{}",
        listener.local_addr().unwrap_or(config.bind_address)
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
