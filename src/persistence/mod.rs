//! Persistence layer: the durable set of locally hidden shop ids.
//!
//! Hidden shops are a per-user visibility filter and never touch the
//! chain. The set lives under a single key, `deleted_shop_ids`, as a JSON
//! array of address strings. [`DeletedShopStore`] abstracts where that key
//! is kept: in memory, in a JSON file or in a PostgreSQL key/value table.

pub mod json_file;
pub mod postgres;

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::domain::ShopAddress;

pub use json_file::JsonFileDeletedShops;
pub use postgres::PostgresDeletedShops;

/// Storage key holding the hidden shop ids.
pub const DELETED_SHOPS_KEY: &str = "deleted_shop_ids";

/// Errors raised by a [`DeletedShopStore`].
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The stored value is not a JSON array of addresses.
    #[error("stored value under {DELETED_SHOPS_KEY} is malformed: {0}")]
    Malformed(String),
}

/// Durable storage for the hidden shop id set.
pub trait DeletedShopStore: Send + Sync + fmt::Debug {
    /// Loads the stored set; an absent key is an empty set.
    fn load(&self) -> BoxFuture<'_, Result<HashSet<ShopAddress>, PersistenceError>>;

    /// Replaces the stored set with `ids`.
    fn save<'a>(
        &'a self,
        ids: &'a HashSet<ShopAddress>,
    ) -> BoxFuture<'a, Result<(), PersistenceError>>;
}

/// Encodes the set as a sorted JSON array of address strings.
#[must_use]
pub fn encode_ids(ids: &HashSet<ShopAddress>) -> serde_json::Value {
    let mut sorted: Vec<String> = ids.iter().map(ToString::to_string).collect();
    sorted.sort();
    serde_json::Value::from(sorted)
}

/// Decodes a stored JSON array of address strings.
///
/// # Errors
///
/// Returns [`PersistenceError::Malformed`] if `value` is not an array of
/// valid addresses.
pub fn decode_ids(value: serde_json::Value) -> Result<HashSet<ShopAddress>, PersistenceError> {
    serde_json::from_value(value).map_err(|e| PersistenceError::Malformed(e.to_string()))
}

/// In-process store. Sharing one instance through an `Arc` across two
/// sessions simulates a reload.
#[derive(Debug, Default)]
pub struct MemoryDeletedShops {
    value: Mutex<Option<serde_json::Value>>,
}

impl MemoryDeletedShops {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeletedShopStore for MemoryDeletedShops {
    fn load(&self) -> BoxFuture<'_, Result<HashSet<ShopAddress>, PersistenceError>> {
        async move {
            let stored = self
                .value
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            stored.map_or_else(|| Ok(HashSet::new()), decode_ids)
        }
        .boxed()
    }

    fn save<'a>(
        &'a self,
        ids: &'a HashSet<ShopAddress>,
    ) -> BoxFuture<'a, Result<(), PersistenceError>> {
        async move {
            let encoded = encode_ids(ids);
            *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(encoded);
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Address;

    fn shop(byte: u8) -> ShopAddress {
        ShopAddress::new(Address::from_bytes([byte; 20]))
    }

    #[test]
    fn encoding_is_sorted_strings() {
        let ids: HashSet<_> = [shop(2), shop(1)].into_iter().collect();
        let encoded = encode_ids(&ids);
        assert_eq!(
            encoded,
            serde_json::json!([
                "0x0101010101010101010101010101010101010101",
                "0x0202020202020202020202020202020202020202"
            ])
        );
        let Ok(decoded) = decode_ids(encoded) else {
            panic!("decode failed");
        };
        assert_eq!(decoded, ids);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            decode_ids(serde_json::json!({ "a": 1 })),
            Err(PersistenceError::Malformed(_))
        ));
        assert!(matches!(
            decode_ids(serde_json::json!(["not-an-address"])),
            Err(PersistenceError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn memory_store_starts_empty_and_persists() {
        let store = MemoryDeletedShops::new();
        let Ok(initial) = store.load().await else {
            panic!("load failed");
        };
        assert!(initial.is_empty());

        let ids: HashSet<_> = [shop(7)].into_iter().collect();
        assert!(store.save(&ids).await.is_ok());
        let Ok(loaded) = store.load().await else {
            panic!("load failed");
        };
        assert_eq!(loaded, ids);
    }
}
