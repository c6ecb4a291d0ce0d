//! Session handlers: last recorded error and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::dto::SessionErrorResponse;
use crate::app_state::AppState;

/// `GET /session/error`: Most recent failure of the session.
#[utoipa::path(
    get,
    path = "/api/v1/session/error",
    tag = "Session",
    summary = "Last recorded error",
    description = "Returns the failure recorded by the most recent failed store operation, or `null`.",
    responses(
        (status = 200, description = "Last error", body = SessionErrorResponse),
    )
)]
pub async fn last_error(State(state): State<AppState>) -> impl IntoResponse {
    let error = state.session.store().await.last_error().await;
    Json(SessionErrorResponse { error })
}

/// `DELETE /session/error`: Dismiss the recorded failure.
#[utoipa::path(
    delete,
    path = "/api/v1/session/error",
    tag = "Session",
    summary = "Clear the recorded error",
    responses(
        (status = 204, description = "Error cleared"),
    )
)]
pub async fn clear_error(State(state): State<AppState>) -> impl IntoResponse {
    state.session.store().await.clear_error().await;
    StatusCode::NO_CONTENT
}

/// `DELETE /session`: End the session.
#[utoipa::path(
    delete,
    path = "/api/v1/session",
    tag = "Session",
    summary = "End the session",
    description = "Drops cached shops, products and the recorded error and starts a fresh session. The hidden shop set is durable and survives.",
    responses(
        (status = 204, description = "Session ended"),
    )
)]
pub async fn end_session(State(state): State<AppState>) -> impl IntoResponse {
    let _ = state.session.restart().await;
    StatusCode::NO_CONTENT
}

/// Session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/session", delete(end_session))
        .route("/session/error", get(last_error).delete(clear_error))
}
