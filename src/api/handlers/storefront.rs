//! Public read handlers: storefront lookup and owner sales.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use super::parse_address;
use crate::api::dto::{SalesResponse, StorefrontResponse};
use crate::api::extract::ViewerSigner;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /storefront/{name}`: Public storefront of a published shop.
///
/// # Errors
///
/// Returns [`GatewayError`] if the shop does not exist, is unpublished or
/// the chain cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/storefront/{name}",
    tag = "Storefront",
    summary = "Load a storefront",
    description = "Resolves the shop by registry name and returns it with its active products. Unpublished shops are not found. No wallet is required and the session cache is not touched.",
    params(
        ("name" = String, Path, description = "Registry shop name"),
    ),
    responses(
        (status = 200, description = "Storefront", body = StorefrontResponse),
        (status = 404, description = "Unknown or unpublished shop", body = ErrorResponse),
    )
)]
pub async fn get_storefront(
    State(state): State<AppState>,
    ViewerSigner(signer): ViewerSigner,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let storefront = state
        .session
        .store()
        .await
        .storefront(&name, &signer)
        .await?;
    Ok(Json(StorefrontResponse::from(storefront)))
}

/// `GET /owners/{address}/sales`: Sales totals of an owner's shops.
///
/// # Errors
///
/// Returns [`GatewayError`] if the address is malformed or the shop list
/// had to be synchronized and that failed.
#[utoipa::path(
    get,
    path = "/api/v1/owners/{address}/sales",
    tag = "Storefront",
    summary = "Sales by owner",
    description = "Sums `getTotalSales` over every known shop owned by the address. Shops whose sales cannot be read are listed in `failed_shops`.",
    params(
        ("address" = String, Path, description = "Owner wallet address"),
    ),
    responses(
        (status = 200, description = "Sales summary", body = SalesResponse),
        (status = 400, description = "Malformed address", body = ErrorResponse),
    )
)]
pub async fn owner_sales(
    State(state): State<AppState>,
    ViewerSigner(signer): ViewerSigner,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let owner = parse_address(&address)?;
    let summary = state
        .session
        .store()
        .await
        .sales_by_owner(owner, &signer)
        .await?;
    Ok(Json(SalesResponse::from(summary)))
}

/// Public read routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/storefront/{name}", get(get_storefront))
        .route("/owners/{address}/sales", get(owner_sales))
}
