//! In-process emulation of the registry and shop contracts.
//!
//! [`InMemoryChain`] keeps every deployed shop in a single
//! [`tokio::sync::Mutex`]-protected state and applies the same rules the
//! contracts enforce: registry names are unique, shop writes are restricted
//! to the owner, item ids come from a per-shop sequence. It backs the
//! `CHAIN_BACKEND=memory` development mode and the test suite, which uses
//! its fault-injection hooks to drive error paths.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::Mutex;

use super::contracts::{ChainItem, ItemInput, ShopDetails};
use super::error::{CODE_EXECUTION_REVERTED, ChainError};
use super::{ChainClient, ChainResult, Signer, TxHash};
use crate::domain::{Address, ShopAddress};
use crate::error::ErrorKind;

/// Leading byte of every emulated shop address.
const SHOP_ADDRESS_PREFIX: u8 = 0x5a;

#[derive(Debug)]
struct ShopContract {
    details: ShopDetails,
    published: bool,
    items: Vec<ChainItem>,
    next_item_id: u128,
    total_sales: u128,
}

#[derive(Debug, Default)]
struct ChainState {
    names: Vec<String>,
    by_name: HashMap<String, ShopAddress>,
    shops: HashMap<ShopAddress, ShopContract>,
    deployed: u64,
    tx_count: u64,
    failures: VecDeque<Option<ChainError>>,
    delays: VecDeque<Duration>,
    failing_shops: HashSet<ShopAddress>,
}

impl ChainState {
    /// Pops the next injected failure and the next response delay.
    fn begin(&mut self) -> (Option<ChainError>, Duration) {
        let failure = self.failures.pop_front().flatten();
        let delay = self.delays.pop_front().unwrap_or_default();
        (failure, delay)
    }

    fn next_tx(&mut self) -> TxHash {
        self.tx_count += 1;
        TxHash(format!("0x{:064x}", self.tx_count))
    }

    fn next_address(&mut self) -> ShopAddress {
        self.deployed += 1;
        let mut bytes = [0u8; 20];
        bytes[0] = SHOP_ADDRESS_PREFIX;
        if let Some(tail) = bytes.get_mut(12..) {
            tail.copy_from_slice(&self.deployed.to_be_bytes());
        }
        ShopAddress::new(Address::from_bytes(bytes))
    }

    fn shop(&self, shop: ShopAddress) -> ChainResult<&ShopContract> {
        if self.failing_shops.contains(&shop) {
            return Err(ChainError::new(
                ErrorKind::Network,
                format!("could not reach shop contract {shop}"),
            ));
        }
        self.shops
            .get(&shop)
            .ok_or_else(|| ChainError::new(ErrorKind::Decode, format!("no contract code at {shop}")))
    }

    fn owned_shop(&mut self, signer: &Signer, shop: ShopAddress) -> ChainResult<&mut ShopContract> {
        self.shop(shop)?;
        self.owned_contract(signer, shop)
    }

    /// Owner-checked access that bypasses [`InMemoryChain::fail_shop`], for
    /// registry calls that reach the shop's record directly.
    fn owned_contract(
        &mut self,
        signer: &Signer,
        shop: ShopAddress,
    ) -> ChainResult<&mut ShopContract> {
        let contract = self
            .shops
            .get_mut(&shop)
            .ok_or_else(|| ChainError::new(ErrorKind::Decode, format!("no contract code at {shop}")))?;
        if contract.details.owner != signer.address() {
            return Err(revert("Only owner"));
        }
        Ok(contract)
    }
}

fn revert(reason: &str) -> ChainError {
    ChainError::from_rpc(
        CODE_EXECUTION_REVERTED,
        &format!("execution reverted: {reason}"),
    )
}

fn now_seconds() -> u128 {
    u128::try_from(Utc::now().timestamp()).unwrap_or_default()
}

/// [`ChainClient`] emulating the contracts in memory.
#[derive(Debug, Default)]
pub struct InMemoryChain {
    state: Mutex<ChainState>,
}

impl InMemoryChain {
    /// Creates an empty chain with no shops deployed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call (of any kind) fail with `error`. Queued
    /// failures are consumed in order.
    pub async fn inject_failure(&self, error: ChainError) {
        self.state.lock().await.failures.push_back(Some(error));
    }

    /// Lets the next call through ahead of any queued failures.
    pub async fn pass_next(&self) {
        self.state.lock().await.failures.push_back(None);
    }

    /// Delays the response of the next call by `delay`. The call's result
    /// is computed before the delay, like a slow network response.
    pub async fn delay_next(&self, delay: Duration) {
        self.state.lock().await.delays.push_back(delay);
    }

    /// Makes every call against `shop`'s contract fail until
    /// [`Self::heal_shop`] is called.
    pub async fn fail_shop(&self, shop: ShopAddress) {
        self.state.lock().await.failing_shops.insert(shop);
    }

    /// Undoes [`Self::fail_shop`].
    pub async fn heal_shop(&self, shop: ShopAddress) {
        self.state.lock().await.failing_shops.remove(&shop);
    }

    /// Adds `amount` (18-decimal fixed point) to a shop's sales counter.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Decode`] if no shop is deployed at `shop`.
    pub async fn record_sale(&self, shop: ShopAddress, amount: u128) -> ChainResult<()> {
        let mut state = self.state.lock().await;
        let contract = state
            .shops
            .get_mut(&shop)
            .ok_or_else(|| ChainError::new(ErrorKind::Decode, format!("no contract code at {shop}")))?;
        contract.total_sales = contract.total_sales.saturating_add(amount);
        Ok(())
    }

    /// Returns the number of shops registered.
    pub async fn shop_count(&self) -> usize {
        self.state.lock().await.names.len()
    }

    /// Runs `op` against the state, then applies any queued delay.
    async fn with_state<T>(
        &self,
        op: impl FnOnce(&mut ChainState) -> ChainResult<T>,
    ) -> ChainResult<T> {
        let (result, delay) = {
            let mut state = self.state.lock().await;
            let (failure, delay) = state.begin();
            let result = match failure {
                Some(err) => Err(err),
                None => op(&mut state),
            };
            (result, delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

fn item_from_input(id: u128, input: &ItemInput, created_at: u128) -> ChainItem {
    ChainItem {
        id,
        name: input.name.clone(),
        description: input.description.clone(),
        price: input.price,
        stock: input.stock,
        is_active: true,
        created_at,
        updated_at: now_seconds(),
        ipfs_hashes: input.ipfs_hashes.clone(),
    }
}

impl ChainClient for InMemoryChain {
    fn create_shop<'a>(
        &'a self,
        _signer: &'a Signer,
        details: &'a ShopDetails,
    ) -> BoxFuture<'a, ChainResult<TxHash>> {
        async move {
            self.with_state(|state| {
                if details.shop_name.is_empty() {
                    return Err(revert("Shop name required"));
                }
                if state.by_name.contains_key(&details.shop_name) {
                    return Err(revert("Shop name already exists"));
                }
                let address = state.next_address();
                state.names.push(details.shop_name.clone());
                state.by_name.insert(details.shop_name.clone(), address);
                state.shops.insert(
                    address,
                    ShopContract {
                        details: details.clone(),
                        published: false,
                        items: Vec::new(),
                        next_item_id: 1,
                        total_sales: 0,
                    },
                );
                tracing::debug!(%address, name = %details.shop_name, "shop deployed");
                Ok(state.next_tx())
            })
            .await
        }
        .boxed()
    }

    fn all_shop_names<'a>(&'a self, _signer: &'a Signer) -> BoxFuture<'a, ChainResult<Vec<String>>> {
        async move { self.with_state(|state| Ok(state.names.clone())).await }.boxed()
    }

    fn shop_by_name<'a>(
        &'a self,
        _signer: &'a Signer,
        name: &'a str,
    ) -> BoxFuture<'a, ChainResult<ShopAddress>> {
        async move {
            self.with_state(|state| {
                state
                    .by_name
                    .get(name)
                    .copied()
                    .ok_or_else(|| ChainError::not_found(format!("no shop named {name}")))
            })
            .await
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
            self.with_state(|state| {
                let address = *state
                    .by_name
                    .get(old_name)
                    .ok_or_else(|| revert("Shop not found"))?;
                if new_name.is_empty() {
                    return Err(revert("Shop name required"));
                }
                if state.by_name.contains_key(new_name) {
                    return Err(revert("Shop name already exists"));
                }
                state.owned_contract(signer, address)?.details.shop_name = new_name.to_string();
                state.by_name.remove(old_name);
                state.by_name.insert(new_name.to_string(), address);
                for name in &mut state.names {
                    if name == old_name {
                        *name = new_name.to_string();
                    }
                }
                Ok(state.next_tx())
            })
            .await
        }
        .boxed()
    }

    fn shop_details<'a>(
        &'a self,
        _signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<ShopDetails>> {
        async move {
            self.with_state(|state| Ok(state.shop(shop)?.details.clone()))
                .await
        }
        .boxed()
    }

    fn is_published<'a>(
        &'a self,
        _signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<bool>> {
        async move { self.with_state(|state| Ok(state.shop(shop)?.published)).await }.boxed()
    }

    fn set_published<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        published: bool,
    ) -> BoxFuture<'a, ChainResult<TxHash>> {
        async move {
            self.with_state(|state| {
                state.owned_shop(signer, shop)?.published = published;
                Ok(state.next_tx())
            })
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
            self.with_state(|state| {
                let contract = state.owned_shop(signer, shop)?;
                contract.details.shop_name = shop_name.to_string();
                contract.details.configuration = configuration.to_string();
                Ok(state.next_tx())
            })
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
            self.with_state(|state| {
                let contract = state.owned_shop(signer, shop)?;
                let id = contract.next_item_id;
                contract.next_item_id += 1;
                contract.items.push(item_from_input(id, item, now_seconds()));
                Ok(state.next_tx())
            })
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
            self.with_state(|state| {
                let contract = state.owned_shop(signer, shop)?;
                let existing = contract
                    .items
                    .iter_mut()
                    .find(|existing| existing.id == id)
                    .ok_or_else(|| revert("Product not found"))?;
                *existing = item_from_input(id, item, existing.created_at);
                Ok(state.next_tx())
            })
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
            self.with_state(|state| {
                let contract = state.owned_shop(signer, shop)?;
                let before = contract.items.len();
                contract.items.retain(|existing| existing.id != id);
                if contract.items.len() == before {
                    return Err(revert("Product not found"));
                }
                Ok(state.next_tx())
            })
            .await
        }
        .boxed()
    }

    fn all_items<'a>(
        &'a self,
        _signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<Vec<ChainItem>>> {
        async move { self.with_state(|state| Ok(state.shop(shop)?.items.clone())).await }.boxed()
    }

    fn total_sales<'a>(
        &'a self,
        _signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<u128>> {
        async move { self.with_state(|state| Ok(state.shop(shop)?.total_sales)).await }.boxed()
    }
}
