//! WebSocket subscription tests against a live gateway.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use reqwest::Method;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use common::{OWNER, TestServer, spawn};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(server: &TestServer) -> Client {
    let Ok((socket, _)) = connect_async(format!("ws://{}/ws", server.addr)).await else {
        panic!("ws handshake failed");
    };
    socket
}

async fn send_command(socket: &mut Client, id: &str, payload: Value) {
    let envelope = json!({
        "id": id,
        "type": "command",
        "timestamp": Utc::now(),
        "payload": payload,
    });
    if socket.send(Message::text(envelope.to_string())).await.is_err() {
        panic!("ws send failed");
    }
}

/// Reads the next text frame as JSON.
async fn next_json(socket: &mut Client) -> Value {
    loop {
        let Ok(frame) = tokio::time::timeout(Duration::from_secs(5), socket.next()).await else {
            panic!("timed out waiting for a ws frame");
        };
        let Some(Ok(message)) = frame else {
            panic!("ws stream ended");
        };
        if let Message::Text(text) = message {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("non-JSON frame: {}", text.as_str());
            };
            return value;
        }
    }
}

#[tokio::test]
async fn wildcard_subscriber_sees_shop_creation() {
    let server = spawn().await;
    let mut socket = connect(&server).await;

    send_command(&mut socket, "sub-1", json!({"command": "subscribe", "shop_ids": ["*"]})).await;
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["id"], "sub-1");
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["wildcard"], true);

    let id = server.create_shop("broadcast").await;
    let event = next_json(&mut socket).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["event_type"], "shop_created");
    assert_eq!(event["payload"]["shop_id"], id.as_str());
    assert_eq!(event["payload"]["name"], "broadcast");
}

#[tokio::test]
async fn shop_subscriber_only_sees_its_shop() {
    let server = spawn().await;
    let watched = server.create_shop("watched").await;
    let other = server.create_shop("other").await;
    let mut socket = connect(&server).await;

    send_command(
        &mut socket,
        "sub-2",
        json!({"command": "subscribe", "shop_ids": [watched.clone(), "bogus"]}),
    )
    .await;
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["payload"]["count"], 1);
    assert_eq!(reply["payload"]["rejected"], json!(["bogus"]));

    let (status, _) = server
        .call(Method::DELETE, &format!("/api/v1/shops/{other}"), None, None)
        .await;
    assert_eq!(status, 204);
    let (status, _) = server
        .call(
            Method::PUT,
            &format!("/api/v1/shops/{watched}/published"),
            Some(OWNER),
            Some(json!({"published": true})),
        )
        .await;
    assert_eq!(status, 200);

    let event = next_json(&mut socket).await;
    assert_eq!(event["payload"]["event_type"], "shop_updated");
    assert_eq!(event["payload"]["shop_id"], watched.as_str());
}

#[tokio::test]
async fn commands_read_the_session() {
    let server = spawn().await;
    server.create_shop("listed").await;
    let mut socket = connect(&server).await;

    send_command(&mut socket, "shops", json!({"command": "get_shops"})).await;
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["id"], "shops");
    assert_eq!(reply["payload"]["shops"][0]["name"], "listed");

    send_command(&mut socket, "nope", json!({"command": "launch"})).await;
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["code"], 404);
}
