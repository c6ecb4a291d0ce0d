//! Product handlers: fetch, add, update and delete items of a shop.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use super::{parse_product_id, parse_shop_id};
use crate::api::dto::{ProductDto, ProductListResponse, ProductRequest, fallback_error};
use crate::api::extract::WalletSigner;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /shops/{id}/products`: Fetch a shop's products.
///
/// # Errors
///
/// Returns [`GatewayError::WalletNotConnected`] without a wallet. Chain
/// failures are reported in the body next to the cached products.
#[utoipa::path(
    get,
    path = "/api/v1/shops/{id}/products",
    tag = "Products",
    summary = "List products of a shop",
    description = "Reads every item of the shop contract and replaces the shop's cached products, confirming pending ids. Only the latest of overlapping fetches is applied.",
    params(
        ("id" = String, Path, description = "Shop contract address"),
    ),
    responses(
        (status = 200, description = "Product list", body = ProductListResponse),
        (status = 401, description = "Wallet not connected", body = ErrorResponse),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    WalletSigner(signer): WalletSigner,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_shop_id(&id)?;
    let fetched = state.session.store().await.get_products(id, &signer).await;
    Ok(Json(ProductListResponse {
        error: fallback_error(fetched.error.as_ref()),
        data: fetched.data.into_iter().map(Into::into).collect(),
    }))
}

/// `POST /shops/{id}/products`: Add a product.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid input or chain failure.
#[utoipa::path(
    post,
    path = "/api/v1/shops/{id}/products",
    tag = "Products",
    summary = "Add a product",
    description = "Adds an item to the shop contract. The cached product carries a pending local id until the next fetch of the shop.",
    params(
        ("id" = String, Path, description = "Shop contract address"),
    ),
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product added", body = ProductDto),
        (status = 400, description = "Invalid product", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
    )
)]
pub async fn add_product(
    State(state): State<AppState>,
    WalletSigner(signer): WalletSigner,
    Path(id): Path<String>,
    Json(req): Json<ProductRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_shop_id(&id)?;
    let draft = req.into_draft()?;
    let product = state
        .session
        .store()
        .await
        .add_product(id, draft, &signer)
        .await?;
    Ok((StatusCode::CREATED, Json(ProductDto::from(product))))
}

/// `PUT /shops/{id}/products/{product_id}`: Overwrite a product.
///
/// # Errors
///
/// Returns [`GatewayError`] on invalid input or chain failure.
#[utoipa::path(
    put,
    path = "/api/v1/shops/{id}/products/{product_id}",
    tag = "Products",
    summary = "Update a product",
    params(
        ("id" = String, Path, description = "Shop contract address"),
        ("product_id" = String, Path, description = "Confirmed chain id of the product"),
    ),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductDto),
        (status = 400, description = "Invalid product or pending id", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    WalletSigner(signer): WalletSigner,
    Path((id, product_id)): Path<(String, String)>,
    Json(req): Json<ProductRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_shop_id(&id)?;
    let chain_id = parse_product_id(&product_id)?;
    let draft = req.into_draft()?;
    let product = state
        .session
        .store()
        .await
        .update_product(id, chain_id, draft, &signer)
        .await?;
    Ok(Json(ProductDto::from(product)))
}

/// `DELETE /shops/{id}/products/{product_id}`: Delete a product.
///
/// # Errors
///
/// Returns [`GatewayError`] on a pending id or chain failure.
#[utoipa::path(
    delete,
    path = "/api/v1/shops/{id}/products/{product_id}",
    tag = "Products",
    summary = "Delete a product",
    params(
        ("id" = String, Path, description = "Shop contract address"),
        ("product_id" = String, Path, description = "Confirmed chain id of the product"),
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, description = "Pending or malformed id", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    WalletSigner(signer): WalletSigner,
    Path((id, product_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_shop_id(&id)?;
    let chain_id = parse_product_id(&product_id)?;
    state
        .session
        .store()
        .await
        .delete_product(id, chain_id, &signer)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Product management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shops/{id}/products", get(list_products).post(add_product))
        .route(
            "/shops/{id}/products/{product_id}",
            put(update_product).delete(delete_product),
        )
}
