//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::EventBus;
use crate::ipfs::IpfsUploader;
use crate::service::Session;

/// Names of the backends the gateway was started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct BackendInfo {
    /// Chain backend (`memory` or `rpc`).
    pub chain: &'static str,
    /// IPFS upload backend.
    pub ipfs: &'static str,
    /// Hidden-shop store backend.
    pub deleted_shops: &'static str,
}

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Current session and its synchronization store.
    pub session: Arc<Session>,
    /// Image uploader used by `POST /uploads`.
    pub uploader: Arc<dyn IpfsUploader>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Active backends, reported by `GET /config/backends`.
    pub backends: BackendInfo,
}

impl AppState {
    /// Builds the state around an opened session. The event bus is the
    /// one the session publishes to.
    #[must_use]
    pub fn new(
        session: Arc<Session>,
        uploader: Arc<dyn IpfsUploader>,
        backends: BackendInfo,
    ) -> Self {
        let event_bus = session.event_bus().clone();
        Self {
            session,
            uploader,
            event_bus,
            backends,
        }
    }
}
