//! Product DTOs for list, add and update operations.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Product, ProductDraft, ProductId, ProductMetadata, ShopAddress};
use crate::error::{ErrorBody, GatewayError};

/// Request body for `POST /shops/{id}/products` and
/// `PUT /shops/{id}/products/{product_id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductRequest {
    /// Product name.
    pub name: String,
    /// Product description.
    #[serde(default)]
    pub description: String,
    /// Display price as a decimal string (e.g. `"12.5"`).
    pub price: String,
    /// Units in stock.
    pub stock: u64,
    /// Content identifiers of already uploaded images, in display order.
    #[serde(default)]
    pub images: Vec<String>,
    /// Optional category label.
    #[serde(default)]
    pub category: Option<String>,
}

impl ProductRequest {
    /// Validates the request and converts it into a draft.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an empty name or a
    /// price that is not a non-negative decimal.
    pub fn into_draft(self) -> Result<ProductDraft, GatewayError> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "product name must not be empty".to_string(),
            ));
        }
        let price = Decimal::from_str(self.price.trim()).map_err(|e| {
            GatewayError::InvalidRequest(format!("invalid price '{}': {e}", self.price))
        })?;
        if price.is_sign_negative() && !price.is_zero() {
            return Err(GatewayError::InvalidRequest(format!(
                "price must not be negative: {price}"
            )));
        }
        Ok(ProductDraft {
            name: self.name,
            description: self.description,
            price,
            stock: self.stock,
            images: self.images,
            metadata: ProductMetadata {
                category: self.category,
            },
        })
    }
}

/// A product as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDto {
    /// Product id: the chain id once confirmed, a local id while pending.
    pub id: String,
    /// `pending` until a fetch of the shop returns the chain-assigned id.
    pub state: String,
    /// Owning shop.
    #[schema(value_type = String)]
    pub store_id: ShopAddress,
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Display price as a decimal string.
    pub price: String,
    /// Units in stock.
    pub stock: u64,
    /// Image content identifiers.
    pub images: Vec<String>,
    /// Category label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Whether the product is listed.
    pub is_published: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        let state = match product.id {
            ProductId::Pending { .. } => "pending",
            ProductId::Confirmed { .. } => "confirmed",
        };
        Self {
            id: product.id.to_string(),
            state: state.to_string(),
            store_id: product.store_id,
            name: product.name,
            description: product.description,
            price: product.price.to_string(),
            stock: product.stock,
            images: product.images,
            category: product.metadata.category,
            is_published: product.is_published,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Response body for `GET /shops/{id}/products`.
///
/// When the chain could not be reached `data` holds the shop's cached
/// products and `error` the recorded failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    /// Products of the shop.
    pub data: Vec<ProductDto>,
    /// Failure behind a cache fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}
