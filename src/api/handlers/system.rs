//! System endpoints: health check and backend configuration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::{AppState, BackendInfo};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    ws_clients: usize,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and the number of event subscribers.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ws_clients: state.event_bus.receiver_count(),
        }),
    )
}

/// `GET /config/backends`: Active backends.
#[utoipa::path(
    get,
    path = "/config/backends",
    tag = "System",
    summary = "List active backends",
    description = "Returns which chain, IPFS and hidden-shop backends the gateway was started with.",
    responses(
        (status = 200, description = "Backend names", body = BackendInfo),
    )
)]
pub async fn backends_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.backends))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/backends", get(backends_handler))
}
