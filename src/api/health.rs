//! Health and metrics endpoints
//!
//! - GET /health - liveness, fixed JSON body
//! - GET /metrics - Prometheus text exposition

use crate::metrics::METRICS;
use axum::{http::header, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Liveness response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    })
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_prometheus(),
    )
}

/// Build the service router
pub fn build_router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
