//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{estimate, health};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let estimate_routes = Router::new()
        .route("/", post(estimate))
        .route("/api/estimate", post(estimate));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let max_body_size = state.config.max_body_size;

    Router::new()
        .merge(estimate_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Multipart has its own smaller default; lift it to the same cap
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
