//! Shop DTOs for create, list, update and visibility operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Address, Shop, ShopAddress, ShopCustomization};
use crate::error::ErrorBody;

/// Request body for `POST /shops`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateShopRequest {
    /// Registry-unique shop name.
    pub name: String,
    /// Template the storefront is built from.
    pub template_id: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Storefront configuration: a JSON document, or a string stored verbatim.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
}

/// Request body for `PUT /shops/{id}/configuration`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateConfigurationRequest {
    /// New configuration: a JSON document, or a string stored verbatim.
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
    /// Renames the shop first when set and different from the current name.
    #[serde(default)]
    pub new_name: Option<String>,
}

/// Request body for `PUT /shops/{id}/name`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameShopRequest {
    /// New registry name.
    pub new_name: String,
}

/// Request body for `PUT /shops/{id}/published`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishRequest {
    /// Whether the public storefront should resolve.
    pub published: bool,
}

/// Query parameters for `GET /shops`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListShopsParams {
    /// Return the session cache without contacting the chain.
    #[serde(default)]
    pub cached: bool,
}

/// A shop as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShopDto {
    /// Shop contract address.
    #[schema(value_type = String)]
    pub id: ShopAddress,
    /// Wallet that created the shop.
    #[schema(value_type = String)]
    pub owner_address: Address,
    /// Registry name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Template identifier.
    pub template_id: String,
    /// Thumbnail content identifier.
    pub thumbnail: String,
    /// Raw on-chain configuration string.
    pub configuration: String,
    /// Decoded configuration.
    #[schema(value_type = Object)]
    pub customization: ShopCustomization,
    /// Whether the public storefront resolves.
    pub is_published: bool,
    /// When this session first cached the shop.
    pub created_at: DateTime<Utc>,
    /// Last local mutation.
    pub updated_at: DateTime<Utc>,
}

impl From<Shop> for ShopDto {
    fn from(shop: Shop) -> Self {
        Self {
            id: shop.id,
            owner_address: shop.owner_address,
            name: shop.name,
            description: shop.description,
            template_id: shop.template_id,
            thumbnail: shop.thumbnail,
            configuration: shop.configuration,
            customization: shop.customization,
            is_published: shop.is_published,
            created_at: shop.created_at,
            updated_at: shop.updated_at,
        }
    }
}

/// Response body for shop list endpoints.
///
/// When the chain could not be reached `data` holds the cached shops and
/// `error` the recorded failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShopListResponse {
    /// Shops.
    pub data: Vec<ShopDto>,
    /// Failure behind a cache fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Response body for `GET /shops/hidden`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HiddenShopsResponse {
    /// Hidden shop addresses, sorted.
    #[schema(value_type = Vec<String>)]
    pub shop_ids: Vec<ShopAddress>,
}

/// Turns a request's configuration value into the on-chain string.
///
/// Strings are stored verbatim, `null` becomes an empty document and any
/// other JSON value is serialized.
#[must_use]
pub fn configuration_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(raw) => raw.clone(),
        serde_json::Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}
