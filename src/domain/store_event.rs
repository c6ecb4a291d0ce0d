//! Domain events reflecting synchronization store mutations.
//!
//! Every change to the cached collections emits a [`StoreEvent`] through
//! the [`super::EventBus`]. Events are broadcast to WebSocket subscribers
//! so views re-render without polling.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ShopAddress;
use crate::error::{ErrorKind, Operation};

/// Domain event emitted after every store mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A full registry synchronization replaced the shop collection.
    ShopsSynced {
        /// Number of shops now cached.
        shop_count: usize,
        /// Sync completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A shop was created on chain and cached.
    ShopCreated {
        /// New shop address.
        shop_id: ShopAddress,
        /// Shop name.
        name: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A shop's name, configuration or publish flag changed.
    ShopUpdated {
        /// Shop address.
        shop_id: ShopAddress,
        /// Current shop name.
        name: String,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A shop was hidden from this dashboard.
    ShopHidden {
        /// Shop address.
        shop_id: ShopAddress,
        /// Timestamp of the hide.
        timestamp: DateTime<Utc>,
    },

    /// A hidden shop was restored.
    ShopRestored {
        /// Shop address.
        shop_id: ShopAddress,
        /// Timestamp of the restore.
        timestamp: DateTime<Utc>,
    },

    /// A shop's cached product slice was replaced by a fetch.
    ProductsReplaced {
        /// Shop address.
        shop_id: ShopAddress,
        /// Number of products now cached for the shop.
        product_count: usize,
        /// Replace timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A product was added, updated or removed.
    ProductChanged {
        /// Shop address.
        shop_id: ShopAddress,
        /// Product id (pending local id or chain id).
        product_id: String,
        /// What happened to the product.
        change: ProductChange,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A store operation failed.
    OperationFailed {
        /// Shop the operation targeted, if any.
        shop_id: Option<ShopAddress>,
        /// Failed operation.
        operation: Operation,
        /// Failure classification.
        kind: ErrorKind,
        /// User-facing message.
        message: String,
        /// Failure timestamp.
        timestamp: DateTime<Utc>,
    },
}

/// Kind of product change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductChange {
    /// Product added (pending confirmation by the next fetch).
    Added,
    /// Product fields updated.
    Updated,
    /// Product removed.
    Removed,
}

impl StoreEvent {
    /// Returns the shop this event concerns, or `None` for collection-wide
    /// events.
    #[must_use]
    pub fn shop_id(&self) -> Option<ShopAddress> {
        match self {
            Self::ShopsSynced { .. } => None,
            Self::ShopCreated { shop_id, .. }
            | Self::ShopUpdated { shop_id, .. }
            | Self::ShopHidden { shop_id, .. }
            | Self::ShopRestored { shop_id, .. }
            | Self::ProductsReplaced { shop_id, .. }
            | Self::ProductChanged { shop_id, .. } => Some(*shop_id),
            Self::OperationFailed { shop_id, .. } => *shop_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ShopsSynced { .. } => "shops_synced",
            Self::ShopCreated { .. } => "shop_created",
            Self::ShopUpdated { .. } => "shop_updated",
            Self::ShopHidden { .. } => "shop_hidden",
            Self::ShopRestored { .. } => "shop_restored",
            Self::ProductsReplaced { .. } => "products_replaced",
            Self::ProductChanged { .. } => "product_changed",
            Self::OperationFailed { .. } => "operation_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;

    fn shop() -> ShopAddress {
        ShopAddress::new(Address::from_bytes([9u8; 20]))
    }

    #[test]
    fn sync_event_has_no_shop() {
        let event = StoreEvent::ShopsSynced {
            shop_count: 3,
            timestamp: Utc::now(),
        };
        assert_eq!(event.shop_id(), None);
        assert_eq!(event.event_type_str(), "shops_synced");
    }

    #[test]
    fn product_change_serializes() {
        let event = StoreEvent::ProductChanged {
            shop_id: shop(),
            product_id: "local-1-0".to_string(),
            change: ProductChange::Added,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"product_changed\""));
        assert!(json.contains("\"change\":\"added\""));
        assert!(json.contains(&shop().to_string()));
    }

    #[test]
    fn failure_carries_optional_shop() {
        let event = StoreEvent::OperationFailed {
            shop_id: Some(shop()),
            operation: Operation::AddProduct,
            kind: ErrorKind::NotOwner,
            message: "Only the shop owner can modify this shop".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.shop_id(), Some(shop()));
    }
}
