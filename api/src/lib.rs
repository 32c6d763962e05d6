//! HTTP layer: `/ask`, `/health`, `/drugs`, `/drugs/match` and the static UI.

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, info};

pub use crate::core::app_state::{ApiConfig, AppState};
pub use crate::error_handler::{AppError, AppResult};

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        ask::ask_route::ask_route,
        drugs::{list_drugs_route::list_drugs_route, match_drugs_route::match_drugs_route},
        health::health_route::health_route,
    },
};

/// Builds the application router over `state`.
pub fn router(state: AppState) -> Router {
    let index = ServeFile::new(state.static_dir.join("index.html"));
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/ask", post(ask_route))
        .route("/health", get(health_route))
        .route("/drugs", get(list_drugs_route))
        .route("/drugs/match", get(match_drugs_route))
        .route_service("/", index)
        .nest_service("/static", assets)
        .layer(middleware::from_fn(json_error_mapper))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Binds `cfg.address` and serves until Ctrl+C.
///
/// # Errors
/// [`AppError::Bind`] if the address cannot be bound, [`AppError::Server`] if serving fails.
pub async fn start(cfg: &ApiConfig, state: AppState) -> Result<(), AppError> {
    let listener = TcpListener::bind(&cfg.address)
        .await
        .map_err(|source| AppError::Bind {
            address: cfg.address.clone(),
            source,
        })?;
    info!(address = %cfg.address, static_dir = %cfg.static_dir.display(), "API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("API stopped");
    Ok(())
}

/// Resolves on Ctrl+C. If the handler cannot be installed the server keeps running.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
