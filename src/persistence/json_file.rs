//! JSON file implementation of [`DeletedShopStore`].

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use super::{DELETED_SHOPS_KEY, DeletedShopStore, PersistenceError, decode_ids, encode_ids};
use crate::domain::ShopAddress;

/// Keeps the hidden set in a JSON document `{ "deleted_shop_ids": [...] }`.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a crash never leaves a half-written document.
#[derive(Debug, Clone)]
pub struct JsonFileDeletedShops {
    path: PathBuf,
}

impl JsonFileDeletedShops {
    /// Creates a store backed by the file at `path`. The file is created
    /// on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<HashSet<ShopAddress>, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(err) => return Err(err.into()),
        };
        let mut document: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| PersistenceError::Malformed(e.to_string()))?;
        match document.get_mut(DELETED_SHOPS_KEY) {
            Some(value) => decode_ids(value.take()),
            None => Ok(HashSet::new()),
        }
    }

    async fn write(&self, ids: &HashSet<ShopAddress>) -> Result<(), PersistenceError> {
        let document = serde_json::json!({ DELETED_SHOPS_KEY: encode_ids(ids) });
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| PersistenceError::Malformed(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), count = ids.len(), "hidden shops saved");
        Ok(())
    }
}

impl DeletedShopStore for JsonFileDeletedShops {
    fn load(&self) -> BoxFuture<'_, Result<HashSet<ShopAddress>, PersistenceError>> {
        self.read().boxed()
    }

    fn save<'a>(
        &'a self,
        ids: &'a HashSet<ShopAddress>,
    ) -> BoxFuture<'a, Result<(), PersistenceError>> {
        self.write(ids).boxed()
    }
}
