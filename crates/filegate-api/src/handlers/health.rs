//! Health check handler

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

const STORAGE_PROBE_KEY: &str = "health/probe";
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "alive" or "degraded"
    pub status: String,
    pub storage_backend: String,
    /// "healthy", "timeout" or the error message
    pub storage: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
        (status = 503, description = "Blob store unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage = state.files.storage();

    let storage_status =
        match tokio::time::timeout(CHECK_TIMEOUT, storage.exists(STORAGE_PROBE_KEY)).await {
            Ok(Ok(_)) => "healthy".to_string(),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Storage health check failed");
                format!("unhealthy: {}", e)
            }
            Err(_) => "timeout".to_string(),
        };

    let healthy = storage_status == "healthy";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "alive" } else { "degraded" }.to_string(),
            storage_backend: storage.backend_type().to_string(),
            storage: storage_status,
        }),
    )
}
