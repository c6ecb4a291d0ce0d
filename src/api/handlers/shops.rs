//! Shop handlers: create, sync, update, hide and restore.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use super::parse_shop_id;
use crate::api::dto::{
    CreateShopRequest, HiddenShopsResponse, ListShopsParams, PublishRequest, RenameShopRequest,
    ShopDto, ShopListResponse, UpdateConfigurationRequest, configuration_string, fallback_error,
};
use crate::api::extract::WalletSigner;
use crate::app_state::AppState;
use crate::domain::{Shop, ShopAddress};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::{Fetched, SyncStore};

/// `POST /shops`: Create a shop on chain.
///
/// # Errors
///
/// Returns [`GatewayError`] if the wallet is missing or the chain rejects
/// the creation.
#[utoipa::path(
    post,
    path = "/api/v1/shops",
    tag = "Shops",
    summary = "Create a shop",
    description = "Deploys a shop through the registry with a placeholder thumbnail, then reads it back by name and caches it.",
    request_body = CreateShopRequest,
    responses(
        (status = 201, description = "Shop created", body = ShopDto),
        (status = 401, description = "Wallet not connected", body = ErrorResponse),
        (status = 422, description = "Rejected by the user or reverted", body = ErrorResponse),
    )
)]
pub async fn create_shop(
    State(state): State<AppState>,
    WalletSigner(signer): WalletSigner,
    Json(req): Json<CreateShopRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let configuration = configuration_string(&req.configuration);
    let shop = state
        .session
        .store()
        .await
        .create_shop(
            &req.name,
            &req.template_id,
            &req.description,
            &configuration,
            &signer,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ShopDto::from(shop))))
}

/// `GET /shops`: Synchronize and list shops.
///
/// # Errors
///
/// Returns [`GatewayError::WalletNotConnected`] without a wallet. Chain
/// failures are reported in the body next to the cached list.
#[utoipa::path(
    get,
    path = "/api/v1/shops",
    tag = "Shops",
    summary = "List shops",
    description = "Rebuilds the shop cache from the registry, skipping hidden shops. If the registry cannot be read the cached list is returned with an `error`. With `cached=true` the chain is not contacted.",
    params(ListShopsParams),
    responses(
        (status = 200, description = "Shop list", body = ShopListResponse),
        (status = 401, description = "Wallet not connected", body = ErrorResponse),
    )
)]
pub async fn list_shops(
    State(state): State<AppState>,
    WalletSigner(signer): WalletSigner,
    Query(params): Query<ListShopsParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let store = state.session.store().await;
    if params.cached {
        return Ok(Json(ShopListResponse {
            data: store.shops().await.into_iter().map(Into::into).collect(),
            error: None,
        }));
    }
    Ok(Json(shop_list(store.get_all_shops(&signer).await)))
}

/// `GET /shops/{id}`: Get a cached shop.
///
/// # Errors
///
/// Returns [`GatewayError::ShopNotFound`] if the shop is not cached.
#[utoipa::path(
    get,
    path = "/api/v1/shops/{id}",
    tag = "Shops",
    summary = "Get a shop",
    description = "Returns a shop from the session cache.",
    params(
        ("id" = String, Path, description = "Shop contract address"),
    ),
    responses(
        (status = 200, description = "Shop details", body = ShopDto),
        (status = 404, description = "Shop not cached", body = ErrorResponse),
    )
)]
pub async fn get_shop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_shop_id(&id)?;
    let store = state.session.store().await;
    let shop = cached_shop(&store, id).await?;
    Ok(Json(ShopDto::from(shop)))
}

/// `DELETE /shops/{id}`: Hide a shop from this dashboard.
///
/// # Errors
///
/// Returns [`GatewayError`] if the hidden set could not be persisted. The
/// shop stays hidden for the session either way.
#[utoipa::path(
    delete,
    path = "/api/v1/shops/{id}",
    tag = "Shops",
    summary = "Hide a shop",
    description = "Adds the shop to the persisted hidden set and drops it and its products from the cache. Nothing happens on chain.",
    params(
        ("id" = String, Path, description = "Shop contract address"),
    ),
    responses(
        (status = 204, description = "Shop hidden"),
        (status = 500, description = "Hidden set not persisted", body = ErrorResponse),
    )
)]
pub async fn delete_shop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_shop_id(&id)?;
    state.session.store().await.delete_store(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /shops/{id}/restore`: Un-hide a shop and resynchronize.
///
/// # Errors
///
/// Returns [`GatewayError::WalletNotConnected`] without a wallet.
#[utoipa::path(
    post,
    path = "/api/v1/shops/{id}/restore",
    tag = "Shops",
    summary = "Restore a hidden shop",
    description = "Removes the shop from the hidden set and rebuilds the shop cache. Its products must be fetched separately.",
    params(
        ("id" = String, Path, description = "Shop contract address"),
    ),
    responses(
        (status = 200, description = "Synchronized shop list", body = ShopListResponse),
        (status = 401, description = "Wallet not connected", body = ErrorResponse),
    )
)]
pub async fn restore_shop(
    State(state): State<AppState>,
    WalletSigner(signer): WalletSigner,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_shop_id(&id)?;
    let synced = state
        .session
        .store()
        .await
        .restore_store(id, &signer)
        .await;
    Ok(Json(shop_list(synced)))
}

/// `GET /shops/hidden`: List hidden shop ids.
#[utoipa::path(
    get,
    path = "/api/v1/shops/hidden",
    tag = "Shops",
    summary = "List hidden shops",
    description = "Returns the ids in the persisted hidden set.",
    responses(
        (status = 200, description = "Hidden shop ids", body = HiddenShopsResponse),
    )
)]
pub async fn hidden_shops(State(state): State<AppState>) -> impl IntoResponse {
    let shop_ids = state.session.store().await.hidden_shops().await;
    Json(HiddenShopsResponse { shop_ids })
}

/// `PUT /shops/{id}/configuration`: Write a shop's configuration.
///
/// # Errors
///
/// Returns [`GatewayError::ShopNotFound`] if the shop is not cached, or
/// the chain failure.
#[utoipa::path(
    put,
    path = "/api/v1/shops/{id}/configuration",
    tag = "Shops",
    summary = "Update shop configuration",
    description = "Renames the shop first when `new_name` differs from the current name, then writes the configuration. The two writes are separate transactions.",
    params(
        ("id" = String, Path, description = "Shop contract address"),
    ),
    request_body = UpdateConfigurationRequest,
    responses(
        (status = 200, description = "Updated shop", body = ShopDto),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Shop not cached", body = ErrorResponse),
    )
)]
pub async fn update_configuration(
    State(state): State<AppState>,
    WalletSigner(signer): WalletSigner,
    Path(id): Path<String>,
    Json(req): Json<UpdateConfigurationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_shop_id(&id)?;
    let store = state.session.store().await;
    let current = cached_shop(&store, id).await?;
    let configuration = configuration_string(&req.configuration);
    store
        .update_configuration(
            &current.name,
            id,
            &configuration,
            req.new_name.as_deref(),
            &signer,
        )
        .await?;
    Ok(Json(ShopDto::from(cached_shop(&store, id).await?)))
}

/// `PUT /shops/{id}/name`: Rename a shop in the registry.
///
/// # Errors
///
/// Returns [`GatewayError::ShopNotFound`] if the shop is not cached, or
/// the chain failure.
#[utoipa::path(
    put,
    path = "/api/v1/shops/{id}/name",
    tag = "Shops",
    summary = "Rename a shop",
    params(
        ("id" = String, Path, description = "Shop contract address"),
    ),
    request_body = RenameShopRequest,
    responses(
        (status = 200, description = "Renamed shop", body = ShopDto),
        (status = 404, description = "Shop not cached", body = ErrorResponse),
        (status = 422, description = "Name taken or rejected", body = ErrorResponse),
    )
)]
pub async fn rename_shop(
    State(state): State<AppState>,
    WalletSigner(signer): WalletSigner,
    Path(id): Path<String>,
    Json(req): Json<RenameShopRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_shop_id(&id)?;
    if req.new_name.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "new_name must not be empty".to_string(),
        ));
    }
    let store = state.session.store().await;
    let current = cached_shop(&store, id).await?;
    store
        .update_shop_name(id, &current.name, &req.new_name, &signer)
        .await?;
    Ok(Json(ShopDto::from(cached_shop(&store, id).await?)))
}

/// `PUT /shops/{id}/published`: Publish or unpublish a storefront.
///
/// # Errors
///
/// Returns [`GatewayError::ShopNotFound`] if the shop is not cached, or
/// the chain failure.
#[utoipa::path(
    put,
    path = "/api/v1/shops/{id}/published",
    tag = "Shops",
    summary = "Set publish state",
    params(
        ("id" = String, Path, description = "Shop contract address"),
    ),
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Updated shop", body = ShopDto),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Shop not cached", body = ErrorResponse),
    )
)]
pub async fn set_published(
    State(state): State<AppState>,
    WalletSigner(signer): WalletSigner,
    Path(id): Path<String>,
    Json(req): Json<PublishRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_shop_id(&id)?;
    let store = state.session.store().await;
    cached_shop(&store, id).await?;
    store.set_published(id, req.published, &signer).await?;
    Ok(Json(ShopDto::from(cached_shop(&store, id).await?)))
}

/// Shop management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shops", post(create_shop).get(list_shops))
        .route("/shops/hidden", get(hidden_shops))
        .route("/shops/{id}", get(get_shop).delete(delete_shop))
        .route("/shops/{id}/restore", post(restore_shop))
        .route("/shops/{id}/configuration", put(update_configuration))
        .route("/shops/{id}/name", put(rename_shop))
        .route("/shops/{id}/published", put(set_published))
}

async fn cached_shop(store: &SyncStore, id: ShopAddress) -> Result<Shop, GatewayError> {
    store
        .get_shop(id)
        .await
        .ok_or_else(|| GatewayError::ShopNotFound(id.to_string()))
}

fn shop_list(fetched: Fetched<Vec<Shop>>) -> ShopListResponse {
    ShopListResponse {
        error: fallback_error(fetched.error.as_ref()),
        data: fetched.data.into_iter().map(Into::into).collect(),
    }
}
