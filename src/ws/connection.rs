//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::{SubscriptionManager, Targets};
use crate::api::dto::{ProductDto, ShopDto};
use crate::domain::{ShopAddress, StoreEvents};
use crate::service::Session;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and answers them.
/// - Forwards events matching the connection's subscriptions to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut events: StoreEvents,
    session: Arc<Session>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &session).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = events.next() => {
                let Some(store_event) = event else { break };
                if !subs.matches(store_event.shop_id()) {
                    continue;
                }
                let msg = WsMessage::new(
                    uuid::Uuid::new_v4().to_string(),
                    WsMessageType::Event,
                    serde_json::to_value(&store_event).unwrap_or_default(),
                );
                if let Some(json) = msg.to_text()
                    && ws_tx.send(Message::text(json)).await.is_err() {
                        break;
                    }
            }
        }
    }

    tracing::debug!(missed_events = events.missed(), "ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    session: &Session,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON").to_text();
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command").to_text();
    };

    let payload = match command {
        WsCommand::Subscribe { shop_ids } => {
            let targets = Targets::parse(&shop_ids);
            subs.subscribe(&targets.ids, targets.wildcard);
            serde_json::json!({
                "subscribed": addresses(&targets.ids),
                "rejected": targets.rejected,
                "count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::Unsubscribe { shop_ids } => {
            let targets = Targets::parse(&shop_ids);
            subs.unsubscribe(&targets.ids, targets.wildcard);
            serde_json::json!({
                "unsubscribed": addresses(&targets.ids),
                "rejected": targets.rejected,
                "remaining_count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::GetShops => {
            let shops: Vec<ShopDto> = session
                .store()
                .await
                .shops()
                .await
                .into_iter()
                .map(Into::into)
                .collect();
            serde_json::json!({ "shops": shops })
        }
        WsCommand::GetProducts { shop_id } => {
            let Ok(id) = shop_id.parse::<ShopAddress>() else {
                return WsMessage::error(msg.id, 400, "invalid shop id").to_text();
            };
            let products: Vec<ProductDto> = session
                .store()
                .await
                .cached_products(id)
                .await
                .into_iter()
                .map(Into::into)
                .collect();
            serde_json::json!({ "shop_id": id, "products": products })
        }
        WsCommand::GetError => {
            let error = session.store().await.last_error().await;
            serde_json::json!({ "error": error })
        }
    };

    WsMessage::new(msg.id, WsMessageType::Response, payload).to_text()
}

fn addresses(ids: &[ShopAddress]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}
