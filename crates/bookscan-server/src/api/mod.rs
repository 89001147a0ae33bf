//! HTTP surface assembly

pub mod response;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::features::{self, FeatureState};
use crate::middleware;

/// Maximum accepted request body. Comfortably above the 5MB image cap so
/// mildly oversized uploads reach size validation; bodies cut off at this
/// limit are mapped to the same validation error by the scan route.
const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Build the application router with all routes and middleware
pub fn router(state: FeatureState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state.clone())
        .nest("/api", features::router(state))
        // Layers apply from innermost to outermost
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Health check handler, probes backend connectivity through the adapter
async fn health_check(State(state): State<FeatureState>) -> Result<Response, StatusCode> {
    match state.db.ping().await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response()),
        Err(err) => {
            tracing::error!(error = %err, "Database health check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}
