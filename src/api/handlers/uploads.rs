//! Image upload handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::UploadRequest;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::ipfs::UploadResult;

/// `POST /uploads`: Pin an image to IPFS.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the inline payload cannot
/// be decoded. Backend failures are reported as a `502` carrying the
/// [`UploadResult`].
#[utoipa::path(
    post,
    path = "/api/v1/uploads",
    tag = "Uploads",
    summary = "Upload an image",
    description = "Pins an image with the configured IPFS backend and returns its content identifier and gateway URL. Store the returned `hash` in a product's `images`.",
    request_body = UploadRequest,
    responses(
        (status = 201, description = "Image pinned", body = UploadResult),
        (status = 400, description = "Undecodable payload", body = ErrorResponse),
        (status = 502, description = "Backend rejected the upload", body = UploadResult),
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let source = req.into_source()?;
    let result = state.uploader.upload(source).await;
    let status = if result.success {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(result)))
}

/// Upload routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/uploads", post(upload_image))
}
