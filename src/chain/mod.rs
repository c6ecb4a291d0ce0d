//! Chain client: calls against the registry and per-shop contracts.
//!
//! [`ChainClient`] is the seam between the synchronization store and the
//! blockchain. It is stateless from the store's point of view; every call
//! carries the [`Signer`] it acts for. Two implementations ship with the
//! crate: [`JsonRpcChainClient`] for a real node or wallet bridge and
//! [`InMemoryChain`] for development and tests.

pub mod abi;
pub mod contracts;
pub mod error;
pub mod memory;
pub mod rpc;

use std::fmt;

use futures_util::future::BoxFuture;

pub use contracts::{ChainItem, ItemInput, ShopDetails};
pub use error::ChainError;
pub use memory::InMemoryChain;
pub use rpc::JsonRpcChainClient;

use crate::domain::{Address, ShopAddress};

/// Result alias for chain calls.
pub type ChainResult<T> = Result<T, ChainError>;

/// The wallet account a call is made for.
///
/// Transactions are sent `from` this account; the provider behind the
/// client performs the actual signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signer {
    address: Address,
}

impl Signer {
    /// Creates a signer for the given wallet address.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self { address }
    }

    /// Returns the wallet address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }
}

/// Hash of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calls against the registry contract and the shop contracts it deploys.
///
/// Write methods resolve only once the transaction is confirmed.
pub trait ChainClient: Send + Sync + fmt::Debug {
    /// `createShop(details)` on the registry.
    fn create_shop<'a>(
        &'a self,
        signer: &'a Signer,
        details: &'a ShopDetails,
    ) -> BoxFuture<'a, ChainResult<TxHash>>;

    /// `getAllShops()` on the registry.
    fn all_shop_names<'a>(&'a self, signer: &'a Signer) -> BoxFuture<'a, ChainResult<Vec<String>>>;

    /// `getShopByName(name)` on the registry. Unknown names are
    /// [`crate::error::ErrorKind::NotFound`].
    fn shop_by_name<'a>(
        &'a self,
        signer: &'a Signer,
        name: &'a str,
    ) -> BoxFuture<'a, ChainResult<ShopAddress>>;

    /// `updateShopName(old, new)` on the registry.
    fn rename_shop<'a>(
        &'a self,
        signer: &'a Signer,
        old_name: &'a str,
        new_name: &'a str,
    ) -> BoxFuture<'a, ChainResult<TxHash>>;

    /// `shopDetails()` on a shop.
    fn shop_details<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<ShopDetails>>;

    /// `isPublished()` on a shop.
    fn is_published<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<bool>>;

    /// `setPublished(flag)` on a shop.
    fn set_published<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        published: bool,
    ) -> BoxFuture<'a, ChainResult<TxHash>>;

    /// `updateConfiguration(shopName, configuration)` on a shop.
    fn update_configuration<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        shop_name: &'a str,
        configuration: &'a str,
    ) -> BoxFuture<'a, ChainResult<TxHash>>;

    /// `addProduct(item)` on a shop.
    fn add_item<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        item: &'a ItemInput,
    ) -> BoxFuture<'a, ChainResult<TxHash>>;

    /// `updateProduct(id, item)` on a shop.
    fn update_item<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        id: u128,
        item: &'a ItemInput,
    ) -> BoxFuture<'a, ChainResult<TxHash>>;

    /// `deleteProduct(id)` on a shop.
    fn delete_item<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
        id: u128,
    ) -> BoxFuture<'a, ChainResult<TxHash>>;

    /// `getAllItems()` on a shop.
    fn all_items<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<Vec<ChainItem>>>;

    /// `getTotalSales()` on a shop, as an 18-decimal fixed-point value.
    fn total_sales<'a>(
        &'a self,
        signer: &'a Signer,
        shop: ShopAddress,
    ) -> BoxFuture<'a, ChainResult<u128>>;
}
