//! Domain layer: shops, products, prices, the session catalog and the
//! event system.
//!
//! This module contains the client-side model of on-chain shops and
//! products, the in-memory [`Catalog`] the synchronization store owns, and
//! the event bus broadcasting its changes.

pub mod address;
pub mod catalog;
pub mod event_bus;
pub mod price;
pub mod product;
pub mod shop;
pub mod store_event;

pub use address::{Address, AddressParseError, ShopAddress};
pub use catalog::{Catalog, Ticket};
pub use event_bus::{EventBus, StoreEvents};
pub use product::{Product, ProductDraft, ProductId, ProductMetadata};
pub use shop::{HeroContent, Shop, ShopCustomization, ThemeColors};
pub use store_event::{ProductChange, StoreEvent};
