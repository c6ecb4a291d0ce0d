//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams [`crate::domain::StoreEvent`]s
//! for the shops a client subscribes to and answers cache read commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
