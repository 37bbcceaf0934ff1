//! Health and metrics handlers.

use crate::models::HealthResponse;
use axum::extract::State;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;

/// Liveness check. Does not touch the provider.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Prometheus scrape endpoint.
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
