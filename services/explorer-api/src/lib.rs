//! Explorer session host library.
//!
//! Exposes the router and state so integration tests can drive the service
//! in-process.

pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the service router.
pub fn router(state: Arc<AppState>, prometheus_handle: PrometheusHandle) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        // Catalog
        .route("/api/catalog", get(handlers::catalog_handler))
        // Sessions
        .route("/api/sessions", post(handlers::create_session_handler))
        .route(
            "/api/sessions/:id",
            get(handlers::get_session_handler).delete(handlers::delete_session_handler),
        )
        .route(
            "/api/sessions/:id/events",
            post(handlers::session_event_handler),
        )
        // Tiles for the current overlay
        .route("/api/tiles/:id/:z/:x/:y", get(handlers::tile_handler))
        .layer(Extension(state))
        .layer(Extension(prometheus_handle))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
