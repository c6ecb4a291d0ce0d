//! # storefront-gateway
//!
//! REST API and WebSocket gateway that keeps a client-side view of
//! on-chain shops and their products in sync with the chain.
//!
//! Shops live in per-shop contracts discovered through a registry
//! contract; product images are pinned to IPFS. The [`service::SyncStore`]
//! caches what the chain returns, hides shops the user deleted (a local,
//! persisted filter) and classifies every failure into an
//! [`error::ErrorKind`].
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── Session / SyncStore (service/)
//!     ├── EventBus, Catalog (domain/)
//!     │
//!     ├── ChainClient (chain/)         JSON-RPC | in-memory
//!     ├── IpfsUploader (ipfs/)         placeholder | pinata | gateway | local
//!     └── DeletedShopStore (persistence/)  memory | JSON file | PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod chain;
pub mod config;
pub mod domain;
pub mod error;
pub mod ipfs;
pub mod persistence;
pub mod service;
pub mod ws;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the full application: REST routes and `/ws` behind request
/// tracing, a request timeout and permissive CORS.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws::handler::ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
