//! Service layer: session lifecycle and the synchronization store.
//!
//! [`Session`] owns the current [`SyncStore`] and replaces it on logout.
//! [`SyncStore`] orchestrates chain calls, caches their results and emits
//! events through the [`super::domain::EventBus`].

pub mod session;
pub mod sync_store;

pub use session::Session;
pub use sync_store::{
    Fetched, PLACEHOLDER_THUMBNAIL_CID, SalesSummary, ShopSales, Storefront, SyncStore,
};
