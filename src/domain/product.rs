//! Products listed in a shop.
//!
//! A product added in this session is cached under a locally generated
//! [`ProductId::Pending`] id until the next fetch of its shop replaces it
//! with the chain-assigned [`ProductId::Confirmed`] id.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ShopAddress;
use super::price::{self, PriceError};
use crate::chain::{ChainItem, ItemInput};

static LOCAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifier of a cached product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProductId {
    /// Added locally; the chain-assigned id is not known yet.
    Pending {
        /// Timestamp-based client id.
        local_id: String,
    },
    /// Read back from the shop contract.
    Confirmed {
        /// Per-shop sequence value assigned by the contract.
        chain_id: u128,
    },
}

impl ProductId {
    /// Generates a fresh pending id (`local-<unix millis>-<n>`).
    #[must_use]
    pub fn pending() -> Self {
        let n = LOCAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::Pending {
            local_id: format!("local-{}-{n}", Utc::now().timestamp_millis()),
        }
    }

    /// Returns the chain id if this product is confirmed.
    #[must_use]
    pub const fn chain_id(&self) -> Option<u128> {
        match self {
            Self::Confirmed { chain_id } => Some(*chain_id),
            Self::Pending { .. } => None,
        }
    }

    /// Returns `true` while the chain id is unknown.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { local_id } => f.write_str(local_id),
            Self::Confirmed { chain_id } => write!(f, "{chain_id}"),
        }
    }
}

/// Free-form product metadata kept alongside the chain fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductMetadata {
    /// Category label used by storefront navigation.
    pub category: Option<String>,
}

/// Caller-supplied product fields for add/update.
///
/// Images must already be uploaded; `images` carries their content
/// identifiers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductDraft {
    /// Product name.
    pub name: String,
    /// Product description.
    #[serde(default)]
    pub description: String,
    /// Display price.
    pub price: Decimal,
    /// Units in stock.
    pub stock: u64,
    /// Ordered image content identifiers.
    #[serde(default)]
    pub images: Vec<String>,
    /// Optional metadata.
    #[serde(default)]
    pub metadata: ProductMetadata,
}

impl ProductDraft {
    /// Converts the draft into the shop contract's item input.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the price cannot be represented on chain.
    pub fn to_item_input(&self) -> Result<ItemInput, PriceError> {
        Ok(ItemInput {
            name: self.name.clone(),
            price: price::to_fixed_point(self.price)?,
            stock: u128::from(self.stock),
            description: self.description.clone(),
            ipfs_hashes: self.images.clone(),
        })
    }
}

/// A product cached for a shop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    /// Product identifier (pending or confirmed).
    pub id: ProductId,
    /// Owning shop.
    pub store_id: ShopAddress,
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Display price.
    pub price: Decimal,
    /// Units in stock.
    pub stock: u64,
    /// Ordered image content identifiers.
    pub images: Vec<String>,
    /// Free-form metadata.
    pub metadata: ProductMetadata,
    /// Whether the product is listed (on-chain `isActive`).
    pub is_published: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a pending product for a draft that was just submitted.
    #[must_use]
    pub fn pending(store_id: ShopAddress, draft: ProductDraft) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::pending(),
            store_id,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            stock: draft.stock,
            images: draft.images,
            metadata: draft.metadata,
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Maps a shop contract item tuple to a product.
    ///
    /// Zero timestamps default to the time of this read.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the on-chain price cannot be represented.
    pub fn from_chain(store_id: ShopAddress, item: ChainItem) -> Result<Self, PriceError> {
        let now = Utc::now();
        Ok(Self {
            id: ProductId::Confirmed { chain_id: item.id },
            store_id,
            name: item.name,
            description: item.description,
            price: price::from_fixed_point(item.price)?,
            stock: u64::try_from(item.stock).unwrap_or(u64::MAX),
            images: item.ipfs_hashes,
            metadata: ProductMetadata::default(),
            is_published: item.is_active,
            created_at: timestamp_or(item.created_at, now),
            updated_at: timestamp_or(item.updated_at, now),
        })
    }
}

/// Converts a chain Unix-seconds timestamp, falling back to `fallback`
/// when the field is zero or out of range.
fn timestamp_or(secs: u128, fallback: DateTime<Utc>) -> DateTime<Utc> {
    if secs == 0 {
        return fallback;
    }
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or(fallback)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Address;
    use std::str::FromStr;

    fn shop() -> ShopAddress {
        ShopAddress::new(Address::from_bytes([3u8; 20]))
    }

    fn item(created_at: u128) -> ChainItem {
        ChainItem {
            id: 4,
            name: "Widget".to_string(),
            description: "blue".to_string(),
            price: 9_990_000_000_000_000_000,
            stock: 3,
            is_active: true,
            created_at,
            updated_at: created_at,
            ipfs_hashes: vec!["QmA".to_string(), "QmB".to_string()],
        }
    }

    #[test]
    fn pending_ids_are_unique() {
        let a = ProductId::pending();
        let b = ProductId::pending();
        assert_ne!(a, b);
        assert!(a.is_pending());
        assert_eq!(a.chain_id(), None);
        assert!(a.to_string().starts_with("local-"));
    }

    #[test]
    fn from_chain_converts_price_and_time() {
        let Ok(product) = Product::from_chain(shop(), item(1_700_000_000)) else {
            panic!("convertible item");
        };
        assert_eq!(product.id, ProductId::Confirmed { chain_id: 4 });
        assert_eq!(product.price, Decimal::from_str("9.99").unwrap_or_default());
        assert_eq!(product.stock, 3);
        assert_eq!(product.images, vec!["QmA".to_string(), "QmB".to_string()]);
        assert_eq!(product.created_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn zero_timestamp_uses_read_time() {
        let before = Utc::now();
        let Ok(product) = Product::from_chain(shop(), item(0)) else {
            panic!("convertible item");
        };
        assert!(product.created_at >= before);
    }

    #[test]
    fn draft_to_item_input_scales_price() {
        let draft = ProductDraft {
            name: "Widget".to_string(),
            description: String::new(),
            price: Decimal::from_str("12.5").unwrap_or_default(),
            stock: 2,
            images: vec!["QmX".to_string()],
            metadata: ProductMetadata::default(),
        };
        let Ok(input) = draft.to_item_input() else {
            panic!("convertible draft");
        };
        assert_eq!(input.price, 12_500_000_000_000_000_000);
        assert_eq!(input.stock, 2);
        assert_eq!(input.ipfs_hashes, vec!["QmX".to_string()]);
    }

    #[test]
    fn product_id_serializes_tagged() {
        let json = serde_json::to_value(ProductId::Confirmed { chain_id: 7 }).unwrap_or_default();
        assert_eq!(json, serde_json::json!({"state": "confirmed", "chain_id": 7}));
    }
}
