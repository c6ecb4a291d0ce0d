//! Ethereum JSON-RPC implementation of [`ChainClient`].
//!
//! Reads use `eth_call`; writes use `eth_sendTransaction` so the node or
//! wallet bridge behind `rpc_url` signs for the caller's account, the same
//! way an injected browser provider does. Confirmation is awaited by
//! polling `eth_getTransactionReceipt`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::abi;
use super::contracts::{self, ChainItem, ItemInput, ShopDetails};
use super::error::ChainError;
use super::{ChainClient, ChainResult, Signer, TxHash};
use crate::domain::{Address, ShopAddress};
use crate::error::ErrorKind;

/// Selector of the standard `Error(string)` revert payload.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct CallRequest {
    from: String,
    to: String,
    data: String,
}

/// [`ChainClient`] speaking Ethereum JSON-RPC over HTTP.
#[derive(Debug)]
pub struct JsonRpcChainClient {
    http: reqwest::Client,
    rpc_url: String,
    registry: Address,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl JsonRpcChainClient {
    /// Creates a client for the node at `rpc_url` and the registry
    /// contract deployed at `registry`.
    #[must_use]
    pub fn new(rpc_url: impl Into<String>, registry: Address, poll_interval: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
            registry,
            poll_interval,
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the registry contract address.
    #[must_use]
    pub const fn registry(&self) -> Address {
        self.registry
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> ChainResult<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(method, id, "json-rpc request");

        let response: RpcResponse<T> = self
            .http
            .post(&self.rpc_url)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            let message = revert_message(&err);
            tracing::debug!(method, code = err.code, %message, "json-rpc error");
            return Err(ChainError::from_rpc(err.code, &message));
        }
        Ok(response.result)
    }

    async fn call(&self, signer: &Signer, to: Address, data: Vec<u8>) -> ChainResult<Vec<u8>> {
        let call = CallRequest {
            from: signer.address().to_string(),
            to: to.to_string(),
            data: abi::to_hex(&data),
        };
        let params = serde_json::json!([call, "latest"]);
        let result: Option<String> = self.request("eth_call", params).await?;
        let result =
            result.ok_or_else(|| ChainError::new(ErrorKind::Decode, "eth_call returned null"))?;
        Ok(abi::from_hex(&result)?)
    }

    async fn send(&self, signer: &Signer, to: Address, data: Vec<u8>) -> ChainResult<TxHash> {
        let call = CallRequest {
            from: signer.address().to_string(),
            to: to.to_string(),
            data: abi::to_hex(&data),
        };
        let params = serde_json::json!([call]);
        let hash: Option<String> = self.request("eth_sendTransaction", params).await?;
        let hash = TxHash(hash.ok_or_else(|| {
            ChainError::new(ErrorKind::Decode, "eth_sendTransaction returned null")
        })?);
        tracing::info!(%hash, %to, "transaction submitted");
        self.wait_for_receipt(&hash).await?;
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> ChainResult<()> {
        loop {
            let receipt: Option<Receipt> = self
                .request("eth_getTransactionReceipt", serde_json::json!([hash.0]))
                .await?;
            match receipt {
                Some(receipt) if receipt.status.as_deref() == Some("0x0") => {
                    tracing::warn!(%hash, "transaction reverted");
                    return Err(ChainError::reverted(format!("transaction {hash} reverted")));
                }
                Some(_) => {
                    tracing::info!(%hash, "transaction confirmed");
                    return Ok(());
                }
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}

/// Appends the decoded `Error(string)` reason carried in `data`, if the
/// message does not already include it.
fn revert_message(err: &RpcErrorObject) -> String {
    let reason = err
        .data
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|hex| abi::from_hex(hex).ok())
        .and_then(|bytes| {
            let payload = bytes.strip_prefix(&ERROR_STRING_SELECTOR[..])?;
            abi::decode(&[abi::ParamType::String], payload)
                .ok()?
                .into_iter()
                .next()
                .and_then(|t| t.into_string().ok())
        });
    match reason {
        Some(reason) if !err.message.contains(&reason) => format!("{}: {reason}", err.message),
        _ => err.message.clone(),
    }
}

impl ChainClient for JsonRpcChainClient {
    fn create_shop<'a>(
        &'a self,
        signer: &'a Signer,
        details: &'a ShopDetails,
    ) -> BoxFuture<'a, ChainResult<TxHash>> {
        async move {
            self.send(signer, self.registry, contracts::encode_create_shop(details))
                .await
        }
        .boxed()
    }

    fn all_shop_names<'a>(&'a self, signer: &'a Signer) -> BoxFuture<'a, ChainResult<Vec<String>>> {
        async move {
            let data = self
                .call(signer, self.registry, contracts::encode_get_all_shops())
                .await?;
            Ok(contracts::decode_shop_names(&data)?)
        }
        .boxed()
    }

    fn shop_by_name<'a>(
        &'a self,
        signer: &'a Signer,
        name: &'a str,
    ) -> BoxFuture<'a, ChainResult<ShopAddress>> {
        async move {
            let data = self
                .call(signer, self.registry, contracts::encode_get_shop_by_name(name))
                .await?;
            let address = contracts::decode_address(&data)?;
            if address.is_zero() {
                return Err(ChainError::not_found(format!("no shop named {name}")));
            }
            Ok(ShopAddress::new(address))
        }
        .boxed()
    }

    fn rename_shop<'a>(
        &'a self,
        signer: &'a Signer,
        old_name: &'a str,
        new_name: &'a str,
    ) -> BoxFuture<'a, ChainResult<TxHash>> {
        async move {
            self.send(
                signer,
                self.registry,
                contracts::encode_update_shop_name(old_name, new_name),
            )
            .await
        }
        .boxed()
    }

    fn shop_details<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<ShopDetails>> {
        async move {
            let data = self
                .call(signer, shop.into(), contracts::encode_shop_details())
                .await?;
            Ok(contracts::decode_shop_details(&data)?)
        }
        .boxed()
    }

    fn is_published<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<bool>> {
        async move {
            let data = self
                .call(signer, shop.into(), contracts::encode_is_published())
                .await?;
            Ok(contracts::decode_bool(&data)?)
        }
        .boxed()
    }

    fn set_published<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        published: bool,
    ) -> BoxFuture<'a, ChainResult<TxHash>> {
        async move {
            self.send(signer, shop.into(), contracts::encode_set_published(published))
                .await
        }
        .boxed()
    }

    fn update_configuration<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        shop_name: &'a str,
        configuration: &'a str,
    ) -> BoxFuture<'a, ChainResult<TxHash>> {
        async move {
            self.send(
                signer,
                shop.into(),
                contracts::encode_update_configuration(shop_name, configuration),
            )
            .await
        }
        .boxed()
    }

    fn add_item<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        item: &'a ItemInput,
    ) -> BoxFuture<'a, ChainResult<TxHash>> {
        async move {
            self.send(signer, shop.into(), contracts::encode_add_product(item))
                .await
        }
        .boxed()
    }

    fn update_item<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        id: u128,
        item: &'a ItemInput,
    ) -> BoxFuture<'a, ChainResult<TxHash>> {
        async move {
            self.send(signer, shop.into(), contracts::encode_update_product(id, item))
                .await
        }
        .boxed()
    }

    fn delete_item<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        id: u128,
    ) -> BoxFuture<'a, ChainResult<TxHash>> {
        async move {
            self.send(signer, shop.into(), contracts::encode_delete_product(id))
                .await
        }
        .boxed()
    }

    fn all_items<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<Vec<ChainItem>>> {
        async move {
            let data = self
                .call(signer, shop.into(), contracts::encode_get_all_items())
                .await?;
            Ok(contracts::decode_items(&data)?)
        }
        .boxed()
    }

    fn total_sales<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<u128>> {
        async move {
            let data = self
                .call(signer, shop.into(), contracts::encode_get_total_sales())
                .await?;
            Ok(contracts::decode_uint(&data)?)
        }
        .boxed()
    }
}

/// Wraps an `Error(string)` reason the way Solidity emits it.
#[cfg(test)]
fn error_string_payload(reason: &str) -> String {
    let mut bytes = ERROR_STRING_SELECTOR.to_vec();
    bytes.extend(abi::encode(&[abi::Token::String(reason.to_string())]));
    abi::to_hex(&bytes)
}
