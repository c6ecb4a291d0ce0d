//! REST endpoint handlers organized by resource.

pub mod products;
pub mod session;
pub mod shops;
pub mod storefront;
pub mod system;
pub mod uploads;

use axum::Router;

use crate::app_state::AppState;
use crate::domain::{Address, ShopAddress};
use crate::error::GatewayError;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(shops::routes())
        .merge(products::routes())
        .merge(storefront::routes())
        .merge(uploads::routes())
        .merge(session::routes())
}

// ── Path Parsing Helpers ────────────────────────────────────────────────

/// Parses a shop id path segment.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the segment is not an address.
pub fn parse_shop_id(raw: &str) -> Result<ShopAddress, GatewayError> {
    raw.parse()
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid shop id '{raw}': {e}")))
}

/// Parses a wallet address path segment.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the segment is not an address.
pub fn parse_address(raw: &str) -> Result<Address, GatewayError> {
    raw.parse()
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid address '{raw}': {e}")))
}

/// Parses a product id path segment. Only chain-confirmed ids can be
/// addressed; pending local ids are rejected.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the segment is not a
/// decimal chain id.
pub fn parse_product_id(raw: &str) -> Result<u128, GatewayError> {
    raw.parse().map_err(|_| {
        GatewayError::InvalidRequest(format!(
            "invalid product id '{raw}': expected a confirmed chain id"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_ids_must_be_chain_ids() {
        assert_eq!(parse_product_id("42").ok(), Some(42));
        assert!(matches!(
            parse_product_id("local-1700000000000-0"),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn shop_ids_must_be_addresses() {
        assert!(parse_shop_id("0x2222222222222222222222222222222222222222").is_ok());
        assert!(matches!(
            parse_shop_id("demo"),
            Err(GatewayError::InvalidRequest(_))
        ));
    }
}
