//! PostgreSQL implementation of [`DeletedShopStore`].
//!
//! Uses a generic key/value table so the durable key keeps the same shape
//! it has in browser local storage.

use std::collections::HashSet;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{DELETED_SHOPS_KEY, DeletedShopStore, PersistenceError, decode_ids, encode_ids};
use crate::domain::ShopAddress;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS local_storage (\
     key TEXT PRIMARY KEY, \
     value JSONB NOT NULL, \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresDeletedShops {
    pool: PgPool,
}

impl PostgresDeletedShops {
    /// Wraps an existing pool. The table must already exist; see
    /// [`Self::ensure_schema`].
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and creates the table if missing.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Database`] if the connection or the
    /// schema statement fails.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates the `local_storage` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Database`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    async fn read(&self) -> Result<HashSet<ShopAddress>, PersistenceError> {
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT value FROM local_storage WHERE key = $1",
        )
        .bind(DELETED_SHOPS_KEY)
        .fetch_optional(&self.pool)
        .await?;
        value.map_or_else(|| Ok(HashSet::new()), decode_ids)
    }

    async fn write(&self, ids: &HashSet<ShopAddress>) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO local_storage (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(DELETED_SHOPS_KEY)
        .bind(encode_ids(ids))
        .execute(&self.pool)
        .await?;
        tracing::debug!(count = ids.len(), "hidden shops saved");
        Ok(())
    }
}

impl DeletedShopStore for PostgresDeletedShops {
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
