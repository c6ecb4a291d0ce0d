//! Public storefront and sales DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use super::{ProductDto, ShopDto};
use crate::domain::{Address, ShopAddress};
use crate::service::{SalesSummary, ShopSales, Storefront};

/// Response body for `GET /storefront/{name}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StorefrontResponse {
    /// The published shop.
    pub shop: ShopDto,
    /// Its active products.
    pub products: Vec<ProductDto>,
}

impl From<Storefront> for StorefrontResponse {
    fn from(storefront: Storefront) -> Self {
        Self {
            shop: storefront.shop.into(),
            products: storefront.products.into_iter().map(Into::into).collect(),
        }
    }
}

/// Sales of a single shop.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShopSalesDto {
    /// Shop address.
    #[schema(value_type = String)]
    pub shop_id: ShopAddress,
    /// Shop name.
    pub name: String,
    /// Total sales as a decimal string.
    pub total: String,
}

impl From<ShopSales> for ShopSalesDto {
    fn from(sales: ShopSales) -> Self {
        Self {
            shop_id: sales.shop_id,
            name: sales.name,
            total: sales.total.to_string(),
        }
    }
}

/// Response body for `GET /owners/{address}/sales`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SalesResponse {
    /// Owner the totals belong to.
    #[schema(value_type = String)]
    pub owner: Address,
    /// Sum over every shop that reported.
    pub total: String,
    /// Per-shop totals.
    pub shops: Vec<ShopSalesDto>,
    /// Shops whose sales could not be read.
    #[schema(value_type = Vec<String>)]
    pub failed_shops: Vec<ShopAddress>,
}

impl From<SalesSummary> for SalesResponse {
    fn from(summary: SalesSummary) -> Self {
        Self {
            owner: summary.owner,
            total: summary.total.to_string(),
            shops: summary.shops.into_iter().map(Into::into).collect(),
            failed_shops: summary.failed_shops,
        }
    }
}
