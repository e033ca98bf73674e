//! API route definitions

use crate::packages::PackageRegistry;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PackageRegistry>,
    pub prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and status
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Pack management
        .route("/models", get(handlers::list_models))
        .route("/models/install", post(handlers::install_model))
        .route(
            "/models/install_from_url",
            post(handlers::install_model_from_url),
        )
        .route(
            "/models/{uuid}",
            get(handlers::get_model).delete(handlers::uninstall_model),
        )
        .route("/models/{uuid}/update", post(handlers::update_model))
        .route("/models/{uuid}/load_state", put(handlers::set_load_state))
        // Speaker and style lookups
        .route("/speakers", get(handlers::list_speakers))
        .route("/speakers/{uuid}/detail", get(handlers::speaker_detail))
        .route("/styles/{style_id}", get(handlers::get_style))
        // Pack files are large; the axum default limit is far too small
        .layer(DefaultBodyLimit::max(4 * 1024 * 1024 * 1024))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
