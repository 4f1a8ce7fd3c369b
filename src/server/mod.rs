//! HTTP delivery endpoint
//!
//! Streams hub records to browsers, built with Axum.
//!
//! # Endpoints
//!
//! ## Streaming
//! - `GET /events` - Server-Sent Events, one `data:` event per line
//! - `GET /ws` - WebSocket, one text message per line
//!
//! ## Info
//! - `GET /version` - Crate version as plain text
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Full status with hub counters
//!
//! ## UI
//! - `GET /` - Viewer page (built in, or files from `server.static_dir`)
//!
//! # Example
//!
//! ```rust,no_run
//! use leno::config::ServerConfig;
//! use leno::hub::BroadcastHub;
//! use leno::normalize::LogFormat;
//! use leno::server::{serve, AppState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = Arc::new(BroadcastHub::default());
//!     let state = AppState::new(hub, ServerConfig::default(), LogFormat::Disabled);
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ServerError, ServerResult};
pub use state::AppState;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::hub::BroadcastHub;

/// Build the router with all routes and middleware
///
/// Fails when a static directory is configured but missing.
pub fn build_router(state: AppState) -> ServerResult<Router> {
    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let router = Router::new()
        .route("/events", get(routes::events::events))
        .route("/ws", get(routes::ws::websocket_handler))
        .route("/version", get(routes::version::version))
        .nest("/health", health_routes);

    let router = match &state.config.static_dir {
        Some(dir) => {
            if !dir.is_dir() {
                return Err(ServerError::AssetsUnavailable(dir.clone()));
            }
            tracing::info!(dir = %dir.display(), "Serving UI from static directory");
            router.fallback_service(ServeDir::new(dir))
        }
        None => router.route("/", get(routes::ui::index)),
    };

    // Create shared state
    let shared_state = Arc::new(state);

    Ok(router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state))
}

/// Start the server and run until a shutdown signal arrives
pub async fn serve(state: AppState) -> ServerResult<()> {
    let addr = state.config.addr();
    let hub = Arc::clone(&state.hub);
    let router = build_router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!("leno listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await?;

    tracing::info!("leno shut down gracefully");
    Ok(())
}

/// Wait for a shutdown signal, then end every open stream
///
/// Open streams never finish on their own, so graceful shutdown would wait
/// forever without closing the hub.
async fn shutdown_signal(hub: Arc<BroadcastHub>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown");
    hub.close_all();
}
