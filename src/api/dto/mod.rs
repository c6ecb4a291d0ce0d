//! Data Transfer Objects for REST request/response serialization.
//!
//! Prices and chain ids are serialized as JSON strings to prevent
//! precision loss on 18-decimal and u128 values.

pub mod common_dto;
pub mod product_dto;
pub mod shop_dto;
pub mod storefront_dto;
pub mod upload_dto;

pub use common_dto::*;
pub use product_dto::*;
pub use shop_dto::*;
pub use storefront_dto::*;
pub use upload_dto::*;
