//! Session lifecycle: one [`SyncStore`] per logged-in session.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::SyncStore;
use crate::chain::ChainClient;
use crate::domain::EventBus;
use crate::persistence::DeletedShopStore;

/// Holds the current session's [`SyncStore`] and the collaborators needed
/// to open the next one.
///
/// Handlers clone the current store out with [`Session::store`]; an
/// in-flight request keeps working against the store it started with even
/// if the session ends meanwhile.
#[derive(Debug)]
pub struct Session {
    chain: Arc<dyn ChainClient>,
    deleted_store: Arc<dyn DeletedShopStore>,
    event_bus: EventBus,
    current: RwLock<Arc<SyncStore>>,
}

impl Session {
    /// Opens the first session.
    pub async fn open(
        chain: Arc<dyn ChainClient>,
        deleted_store: Arc<dyn DeletedShopStore>,
        event_bus: EventBus,
    ) -> Self {
        let store = SyncStore::open(
            Arc::clone(&chain),
            Arc::clone(&deleted_store),
            event_bus.clone(),
        )
        .await;
        Self {
            chain,
            deleted_store,
            event_bus,
            current: RwLock::new(Arc::new(store)),
        }
    }

    /// Returns the current session's store.
    pub async fn store(&self) -> Arc<SyncStore> {
        Arc::clone(&*self.current.read().await)
    }

    /// Returns the event bus shared by every session.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Ends the current session and opens a fresh one, returning it.
    pub async fn restart(&self) -> Arc<SyncStore> {
        let mut current = self.current.write().await;
        current.end_session().await;
        let next = Arc::new(
            SyncStore::open(
                Arc::clone(&self.chain),
                Arc::clone(&self.deleted_store),
                self.event_bus.clone(),
            )
            .await,
        );
        *current = Arc::clone(&next);
        next
    }
}
