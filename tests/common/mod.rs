//! Shared harness: a gateway on an ephemeral port backed by the in-memory
//! chain, the placeholder uploader and an in-memory hidden shop store.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use storefront_gateway::app_state::{AppState, BackendInfo};
use storefront_gateway::build_app;
use storefront_gateway::chain::{ChainClient, InMemoryChain};
use storefront_gateway::domain::EventBus;
use storefront_gateway::ipfs::{IpfsUploader, PlaceholderUploader};
use storefront_gateway::persistence::{DeletedShopStore, MemoryDeletedShops};
use storefront_gateway::service::Session;

/// Wallet that owns the shops created by the tests.
pub const OWNER: &str = "0x1111111111111111111111111111111111111111";
/// A second wallet that owns nothing.
pub const STRANGER: &str = "0x2222222222222222222222222222222222222222";

/// A running gateway.
pub struct TestServer {
    /// Bound address.
    pub addr: SocketAddr,
    /// Chain backend, for fault injection and sales.
    pub chain: Arc<InMemoryChain>,
    /// Hidden shop store shared by every session of this server.
    pub deleted: Arc<MemoryDeletedShops>,
    /// HTTP client.
    pub http: reqwest::Client,
}

/// Starts a gateway with a fresh chain and hidden shop store.
pub async fn spawn() -> TestServer {
    spawn_with(Arc::new(MemoryDeletedShops::new())).await
}

/// Starts a gateway whose hidden shop store is `deleted`.
pub async fn spawn_with(deleted: Arc<MemoryDeletedShops>) -> TestServer {
    let chain = Arc::new(InMemoryChain::new());
    let chain_client = Arc::clone(&chain) as Arc<dyn ChainClient>;
    let deleted_store = Arc::clone(&deleted) as Arc<dyn DeletedShopStore>;
    let uploader: Arc<dyn IpfsUploader> =
        Arc::new(PlaceholderUploader::new("https://ipfs.test/ipfs"));

    let session = Arc::new(Session::open(chain_client, deleted_store, EventBus::new(256)).await);
    let state = AppState::new(
        session,
        uploader,
        BackendInfo {
            chain: "memory",
            ipfs: "placeholder",
            deleted_shops: "memory",
        },
    );

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, build_app(state, Duration::from_secs(30))).await;
    });

    TestServer {
        addr,
        chain,
        deleted,
        http: reqwest::Client::new(),
    }
}

impl TestServer {
    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Headers identifying `wallet` as the signer.
    pub fn wallet(wallet: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Ok(value) = HeaderValue::from_str(wallet) else {
            panic!("valid header value");
        };
        headers.insert("x-wallet-address", value);
        headers
    }

    /// Sends a request and returns the status with the JSON body (or
    /// `Value::Null` for empty bodies).
    pub async fn call(
        &self,
        method: reqwest::Method,
        path: &str,
        wallet: Option<&str>,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut request = self.http.request(method, self.url(path));
        if let Some(wallet) = wallet {
            request = request.headers(Self::wallet(wallet));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let Ok(response) = request.send().await else {
            panic!("request to {path} failed");
        };
        let status = response.status().as_u16();
        let Ok(text) = response.text().await else {
            panic!("unreadable body");
        };
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        (status, body)
    }

    /// Creates a shop owned by [`OWNER`] and returns its id.
    pub async fn create_shop(&self, name: &str) -> String {
        let (status, body) = self
            .call(
                reqwest::Method::POST,
                "/api/v1/shops",
                Some(OWNER),
                Some(serde_json::json!({
                    "name": name,
                    "template_id": "minimal",
                    "description": "test shop",
                    "configuration": {"hero": {"title": name}},
                })),
            )
            .await;
        assert_eq!(status, 201, "create failed: {body}");
        let Some(id) = body["id"].as_str() else {
            panic!("shop id missing: {body}");
        };
        id.to_string()
    }
}
