//! Synchronization store: the session's view of on-chain shops and
//! products.
//!
//! [`SyncStore`] mediates between callers and the [`ChainClient`]. It
//! caches what it reads in a [`Catalog`], keeps the persisted set of
//! locally hidden shops, and turns every chain failure into a
//! [`StoreError`]. Failures are both returned to the caller and recorded
//! as the session's last error, so a view that only watches the shared
//! error still sees them.
//!
//! # Concurrency
//!
//! Operations may run concurrently. Product fetches and full syncs carry
//! a [`crate::domain::Ticket`]; a completion only replaces cached data if
//! its ticket is still the latest issued for that shop (or for the
//! registry). A full sync still replaces the whole shop list, so a shop
//! created while a sync is in flight can disappear from the cache until
//! the next sync.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::{join_all, try_join};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::chain::{ChainClient, ChainError, ShopDetails, Signer};
use crate::domain::price::{self, PriceError};
use crate::domain::{
    Address, Catalog, EventBus, Product, ProductChange, ProductDraft, ProductId, Shop,
    ShopAddress, ShopCustomization, StoreEvent,
};
use crate::error::{ErrorKind, Operation, StoreError};
use crate::persistence::DeletedShopStore;

/// Thumbnail identifier every new shop is created with.
pub const PLACEHOLDER_THUMBNAIL_CID: &str = "QmPlaceholderThumbnail";

/// Result of a read that falls back to cached data on failure.
///
/// `data` is always usable: fresh chain data when `error` is `None`,
/// otherwise the cached state at the time of the failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched<T> {
    /// Fresh or cached data.
    pub data: T,
    /// Why the data is cached, if it is.
    pub error: Option<StoreError>,
}

impl<T> Fetched<T> {
    fn fresh(data: T) -> Self {
        Self { data, error: None }
    }

    fn cached(data: T, error: StoreError) -> Self {
        Self {
            data,
            error: Some(error),
        }
    }

    /// Returns `true` if the data came from the chain.
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        self.error.is_none()
    }
}

/// Sales of one shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopSales {
    /// Shop id.
    pub shop_id: ShopAddress,
    /// Shop name.
    pub name: String,
    /// Total sales.
    pub total: Decimal,
}

/// Sales aggregated over every known shop of one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    /// Owner wallet.
    pub owner: Address,
    /// Sum over `shops`.
    pub total: Decimal,
    /// Per-shop totals that could be read.
    pub shops: Vec<ShopSales>,
    /// Shops whose sales could not be read.
    pub failed_shops: Vec<ShopAddress>,
}

/// A published shop with its active products.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Storefront {
    /// The shop.
    pub shop: Shop,
    /// Its active products.
    pub products: Vec<Product>,
}

/// Per-session synchronization store.
#[derive(Debug)]
pub struct SyncStore {
    chain: Arc<dyn ChainClient>,
    deleted_store: Arc<dyn DeletedShopStore>,
    event_bus: EventBus,
    catalog: RwLock<Catalog>,
    hidden: Mutex<HashSet<ShopAddress>>,
    last_error: RwLock<Option<StoreError>>,
}

impl SyncStore {
    /// Opens a session, loading the persisted hidden-shop set.
    ///
    /// A set that cannot be loaded is logged and treated as empty.
    pub async fn open(
        chain: Arc<dyn ChainClient>,
        deleted_store: Arc<dyn DeletedShopStore>,
        event_bus: EventBus,
    ) -> Self {
        let hidden = match deleted_store.load().await {
            Ok(hidden) => hidden,
            Err(err) => {
                tracing::warn!(error = %err, "hidden shop set unavailable, starting empty");
                HashSet::new()
            }
        };
        tracing::info!(hidden = hidden.len(), "session opened");
        Self {
            chain,
            deleted_store,
            event_bus,
            catalog: RwLock::new(Catalog::new()),
            hidden: Mutex::new(hidden),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the event bus this store publishes on.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ── Failures ───────────────────────────────────────────────────────────

    async fn record(&self, error: StoreError, shop_id: Option<ShopAddress>) -> StoreError {
        tracing::warn!(
            operation = ?error.operation,
            kind = error.kind.as_str(),
            shop_id = ?shop_id.map(|s| s.to_string()),
            detail = %error.detail,
            "store operation failed"
        );
        *self.last_error.write().await = Some(error.clone());
        self.event_bus.publish(StoreEvent::OperationFailed {
            shop_id,
            operation: error.operation,
            kind: error.kind,
            message: error.message.clone(),
            timestamp: error.at,
        });
        error
    }

    async fn chain_failure(
        &self,
        operation: Operation,
        shop_id: Option<ShopAddress>,
        err: ChainError,
    ) -> StoreError {
        self.record(StoreError::new(operation, err.kind, err.message), shop_id)
            .await
    }

    async fn price_failure(
        &self,
        operation: Operation,
        shop_id: ShopAddress,
        err: &PriceError,
    ) -> StoreError {
        self.record(
            StoreError::new(operation, ErrorKind::Decode, err.to_string()),
            Some(shop_id),
        )
        .await
    }

    /// Returns the most recently recorded failure.
    pub async fn last_error(&self) -> Option<StoreError> {
        self.last_error.read().await.clone()
    }

    /// Clears the recorded failure.
    pub async fn clear_error(&self) {
        *self.last_error.write().await = None;
    }

    // ── Cached reads ───────────────────────────────────────────────────────

    /// Returns the cached shops.
    pub async fn shops(&self) -> Vec<Shop> {
        self.catalog.read().await.shops().to_vec()
    }

    /// Returns the cached shop with the given id.
    pub async fn get_shop(&self, id: ShopAddress) -> Option<Shop> {
        self.catalog.read().await.shop(id).cloned()
    }

    /// Returns the cached products of one shop.
    pub async fn cached_products(&self, id: ShopAddress) -> Vec<Product> {
        self.catalog.read().await.products_for(id)
    }

    /// Returns the hidden shop ids, sorted.
    pub async fn hidden_shops(&self) -> Vec<ShopAddress> {
        let mut ids: Vec<_> = self.hidden.lock().await.iter().copied().collect();
        ids.sort();
        ids
    }

    // ── Shops ──────────────────────────────────────────────────────────────

    /// Creates a shop on chain and appends it to the cache.
    ///
    /// The shop is created with [`PLACEHOLDER_THUMBNAIL_CID`] and the
    /// signer as owner. After confirmation its address is resolved by
    /// name and its details and publication flag read back.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`]; the cache is unchanged.
    pub async fn create_shop(
        &self,
        name: &str,
        template_id: &str,
        description: &str,
        configuration: &str,
        signer: &Signer,
    ) -> Result<Shop, StoreError> {
        let details = ShopDetails {
            shop_name: name.to_string(),
            shop_type: template_id.to_string(),
            description: description.to_string(),
            configuration: configuration.to_string(),
            thumbnail_ipfs_hash: PLACEHOLDER_THUMBNAIL_CID.to_string(),
            owner: signer.address(),
        };
        let shop = match self.deploy_shop(&details, signer).await {
            Ok(shop) => shop,
            Err(err) => return Err(self.chain_failure(Operation::CreateShop, None, err).await),
        };

        self.catalog.write().await.upsert_shop(shop.clone());
        tracing::info!(shop_id = %shop.id, name, "shop created");
        self.event_bus.publish(StoreEvent::ShopCreated {
            shop_id: shop.id,
            name: shop.name.clone(),
            timestamp: Utc::now(),
        });
        Ok(shop)
    }

    async fn deploy_shop(&self, details: &ShopDetails, signer: &Signer) -> Result<Shop, ChainError> {
        let tx = self.chain.create_shop(signer, details).await?;
        tracing::debug!(%tx, name = %details.shop_name, "create transaction confirmed");
        let address = self.chain.shop_by_name(signer, &details.shop_name).await?;
        let (stored, published) = try_join(
            self.chain.shop_details(signer, address),
            self.chain.is_published(signer, address),
        )
        .await?;
        Ok(Shop::from_details(address, stored, published))
    }

    /// Rebuilds the shop cache from the registry.
    ///
    /// Every registered name is resolved concurrently; hidden shops are
    /// skipped and shops that fail to load are dropped with a warning.
    /// The result replaces the cached list.
    ///
    /// If the registry listing itself fails, the failure is recorded and
    /// the cached list is returned unchanged.
    pub async fn get_all_shops(&self, signer: &Signer) -> Fetched<Vec<Shop>> {
        let ticket = self.catalog.write().await.issue_sync_ticket();

        let names = match self.chain.all_shop_names(signer).await {
            Ok(names) => names,
            Err(err) => {
                let error = self.chain_failure(Operation::SyncShops, None, err).await;
                return Fetched::cached(self.shops().await, error);
            }
        };

        let hidden = self.hidden.lock().await.clone();
        let resolved = join_all(
            names
                .iter()
                .map(|name| self.load_shop(signer, name, &hidden)),
        )
        .await;

        let mut shops: Vec<Shop> = names
            .iter()
            .zip(resolved)
            .filter_map(|(name, outcome)| match outcome {
                Ok(shop) => shop,
                Err(err) => {
                    tracing::warn!(name = %name, kind = err.kind.as_str(), error = %err.message, "shop dropped from sync");
                    None
                }
            })
            .collect();
        // Shops hidden while the reads were in flight.
        {
            let hidden = self.hidden.lock().await;
            shops.retain(|shop| !hidden.contains(&shop.id));
        }

        let mut catalog = self.catalog.write().await;
        if catalog.is_latest_sync(ticket) {
            catalog.replace_shops(shops.clone());
            drop(catalog);
            tracing::info!(shop_count = shops.len(), "shops synchronized");
            self.event_bus.publish(StoreEvent::ShopsSynced {
                shop_count: shops.len(),
                timestamp: Utc::now(),
            });
        } else {
            tracing::debug!(ticket, "stale shop sync discarded");
        }
        Fetched::fresh(shops)
    }

    /// Resolves one registry name. `Ok(None)` means the shop is hidden.
    async fn load_shop(
        &self,
        signer: &Signer,
        name: &str,
        hidden: &HashSet<ShopAddress>,
    ) -> Result<Option<Shop>, ChainError> {
        let address = self.chain.shop_by_name(signer, name).await?;
        if hidden.contains(&address) {
            return Ok(None);
        }
        let (details, published) = try_join(
            self.chain.shop_details(signer, address),
            self.chain.is_published(signer, address),
        )
        .await?;
        Ok(Some(Shop::from_details(address, details, published)))
    }

    /// Renames a shop in the registry.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`]; the cache is unchanged.
    pub async fn update_shop_name(
        &self,
        shop: ShopAddress,
        old_name: &str,
        new_name: &str,
        signer: &Signer,
    ) -> Result<(), StoreError> {
        if let Err(err) = self.chain.rename_shop(signer, old_name, new_name).await {
            return Err(self
                .chain_failure(Operation::RenameShop, Some(shop), err)
                .await);
        }
        let mut catalog = self.catalog.write().await;
        if let Some(cached) = catalog.shop_mut(shop) {
            cached.name = new_name.to_string();
            cached.updated_at = Utc::now();
        }
        drop(catalog);
        tracing::info!(shop_id = %shop, old_name, new_name, "shop renamed");
        self.event_bus.publish(StoreEvent::ShopUpdated {
            shop_id: shop,
            name: new_name.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Writes a shop's configuration, renaming it first when `new_name`
    /// differs from `shop_name`.
    ///
    /// The rename and the configuration write are two transactions. If
    /// the second fails the rename stays on chain while the cache keeps
    /// the old name; the returned error does not say which step failed.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`].
    pub async fn update_configuration(
        &self,
        shop_name: &str,
        shop: ShopAddress,
        configuration: &str,
        new_name: Option<&str>,
        signer: &Signer,
    ) -> Result<(), StoreError> {
        let rename = new_name.filter(|name| *name != shop_name);
        let target_name = rename.unwrap_or(shop_name);

        if let Some(new_name) = rename {
            if let Err(err) = self.chain.rename_shop(signer, shop_name, new_name).await {
                return Err(self
                    .chain_failure(Operation::UpdateConfiguration, Some(shop), err)
                    .await);
            }
        }
        if let Err(err) = self
            .chain
            .update_configuration(signer, shop, target_name, configuration)
            .await
        {
            return Err(self
                .chain_failure(Operation::UpdateConfiguration, Some(shop), err)
                .await);
        }

        let mut catalog = self.catalog.write().await;
        if let Some(cached) = catalog.shop_mut(shop) {
            cached.configuration = configuration.to_string();
            cached.customization = ShopCustomization::from_configuration(configuration);
            cached.name = target_name.to_string();
            cached.updated_at = Utc::now();
        }
        drop(catalog);
        tracing::info!(shop_id = %shop, name = target_name, renamed = rename.is_some(), "configuration updated");
        self.event_bus.publish(StoreEvent::ShopUpdated {
            shop_id: shop,
            name: target_name.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Sets whether a shop's public storefront resolves.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`].
    pub async fn set_published(
        &self,
        shop: ShopAddress,
        published: bool,
        signer: &Signer,
    ) -> Result<(), StoreError> {
        if let Err(err) = self.chain.set_published(signer, shop, published).await {
            return Err(self
                .chain_failure(Operation::PublishShop, Some(shop), err)
                .await);
        }
        let mut catalog = self.catalog.write().await;
        let name = catalog.shop_mut(shop).map(|cached| {
            cached.is_published = published;
            cached.updated_at = Utc::now();
            cached.name.clone()
        });
        drop(catalog);
        tracing::info!(shop_id = %shop, published, "publish state changed");
        self.event_bus.publish(StoreEvent::ShopUpdated {
            shop_id: shop,
            name: name.unwrap_or_default(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Hides a shop from this user's view. No chain call is made.
    ///
    /// The id is added to the persisted hidden set and the shop and its
    /// products leave the cache. A full sync still in flight is discarded
    /// so it cannot bring the shop back. Hiding an already hidden or
    /// unknown id is a no-op beyond the set insert.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`] if the set could not be
    /// persisted; the shop stays hidden for this session.
    pub async fn delete_store(&self, id: ShopAddress) -> Result<(), StoreError> {
        let persisted = {
            let mut hidden = self.hidden.lock().await;
            hidden.insert(id);
            self.deleted_store.save(&hidden).await
        };
        {
            let mut catalog = self.catalog.write().await;
            catalog.remove_shop(id);
            // A sync already past its hidden-set check must not re-add the shop.
            catalog.issue_sync_ticket();
        }
        tracing::info!(shop_id = %id, "shop hidden");
        self.event_bus.publish(StoreEvent::ShopHidden {
            shop_id: id,
            timestamp: Utc::now(),
        });
        if let Err(err) = persisted {
            let error = StoreError::new(Operation::DeleteShop, ErrorKind::Persistence, err.to_string());
            return Err(self.record(error, Some(id)).await);
        }
        Ok(())
    }

    /// Un-hides a shop and rebuilds the shop cache from the registry.
    ///
    /// Products of the restored shop must be fetched separately. A
    /// failure to persist the set is recorded but the sync still runs.
    pub async fn restore_store(&self, id: ShopAddress, signer: &Signer) -> Fetched<Vec<Shop>> {
        let persisted = {
            let mut hidden = self.hidden.lock().await;
            hidden.remove(&id);
            self.deleted_store.save(&hidden).await
        };
        if let Err(err) = persisted {
            let error = StoreError::new(Operation::RestoreShop, ErrorKind::Persistence, err.to_string());
            self.record(error, Some(id)).await;
        }
        tracing::info!(shop_id = %id, "shop restored");
        self.event_bus.publish(StoreEvent::ShopRestored {
            shop_id: id,
            timestamp: Utc::now(),
        });
        self.get_all_shops(signer).await
    }

    // ── Products ───────────────────────────────────────────────────────────

    /// Reads every item of a shop and replaces that shop's cached
    /// products with them, even if the result is empty. Products of
    /// other shops are untouched.
    ///
    /// On failure the error is recorded and the cached products of the
    /// shop are returned.
    pub async fn get_products(&self, shop: ShopAddress, signer: &Signer) -> Fetched<Vec<Product>> {
        let ticket = self.catalog.write().await.issue_product_ticket(shop);

        let items = match self.chain.all_items(signer, shop).await {
            Ok(items) => items,
            Err(err) => {
                let error = self
                    .chain_failure(Operation::FetchProducts, Some(shop), err)
                    .await;
                return Fetched::cached(self.cached_products(shop).await, error);
            }
        };
        let products = match items
            .into_iter()
            .map(|item| Product::from_chain(shop, item))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(products) => products,
            Err(err) => {
                let error = self
                    .price_failure(Operation::FetchProducts, shop, &err)
                    .await;
                return Fetched::cached(self.cached_products(shop).await, error);
            }
        };

        let mut catalog = self.catalog.write().await;
        if catalog.is_latest_products(shop, ticket) {
            catalog.replace_products(shop, products.clone());
            drop(catalog);
            tracing::debug!(shop_id = %shop, product_count = products.len(), "products replaced");
            self.event_bus.publish(StoreEvent::ProductsReplaced {
                shop_id: shop,
                product_count: products.len(),
                timestamp: Utc::now(),
            });
        } else {
            tracing::debug!(shop_id = %shop, ticket, "stale product fetch discarded");
        }
        Fetched::fresh(products)
    }

    /// Adds a product on chain and caches it under a pending local id
    /// until the next [`Self::get_products`] for the shop.
    ///
    /// Images must already be uploaded; `draft.images` holds their
    /// content identifiers.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`]; the cache is unchanged.
    pub async fn add_product(
        &self,
        shop: ShopAddress,
        draft: ProductDraft,
        signer: &Signer,
    ) -> Result<Product, StoreError> {
        let item = match draft.to_item_input() {
            Ok(item) => item,
            Err(err) => return Err(self.price_failure(Operation::AddProduct, shop, &err).await),
        };
        if let Err(err) = self.chain.add_item(signer, shop, &item).await {
            return Err(self
                .chain_failure(Operation::AddProduct, Some(shop), err)
                .await);
        }

        let product = Product::pending(shop, draft);
        self.catalog.write().await.push_product(product.clone());
        tracing::info!(shop_id = %shop, product_id = %product.id, name = %product.name, "product added");
        self.publish_product_change(shop, &product.id, ProductChange::Added);
        Ok(product)
    }

    /// Overwrites a confirmed product on chain and in the cache.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`]; the cache is unchanged.
    pub async fn update_product(
        &self,
        shop: ShopAddress,
        chain_id: u128,
        draft: ProductDraft,
        signer: &Signer,
    ) -> Result<Product, StoreError> {
        let item = match draft.to_item_input() {
            Ok(item) => item,
            Err(err) => return Err(self.price_failure(Operation::UpdateProduct, shop, &err).await),
        };
        if let Err(err) = self.chain.update_item(signer, shop, chain_id, &item).await {
            return Err(self
                .chain_failure(Operation::UpdateProduct, Some(shop), err)
                .await);
        }

        let mut catalog = self.catalog.write().await;
        let updated = if let Some(cached) = catalog.product_mut(shop, chain_id) {
            cached.name = draft.name;
            cached.description = draft.description;
            cached.price = draft.price;
            cached.stock = draft.stock;
            cached.images = draft.images;
            cached.metadata = draft.metadata;
            cached.updated_at = Utc::now();
            cached.clone()
        } else {
            let product = Product {
                id: ProductId::Confirmed { chain_id },
                ..Product::pending(shop, draft)
            };
            catalog.push_product(product.clone());
            product
        };
        drop(catalog);
        tracing::info!(shop_id = %shop, product_id = %chain_id, "product updated");
        self.publish_product_change(shop, &updated.id, ProductChange::Updated);
        Ok(updated)
    }

    /// Deletes a confirmed product on chain and drops it from the cache.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`]; the cache is unchanged.
    pub async fn delete_product(
        &self,
        shop: ShopAddress,
        chain_id: u128,
        signer: &Signer,
    ) -> Result<(), StoreError> {
        if let Err(err) = self.chain.delete_item(signer, shop, chain_id).await {
            return Err(self
                .chain_failure(Operation::DeleteProduct, Some(shop), err)
                .await);
        }
        self.catalog.write().await.remove_product(shop, chain_id);
        tracing::info!(shop_id = %shop, product_id = %chain_id, "product deleted");
        self.publish_product_change(
            shop,
            &ProductId::Confirmed { chain_id },
            ProductChange::Removed,
        );
        Ok(())
    }

    fn publish_product_change(&self, shop: ShopAddress, id: &ProductId, change: ProductChange) {
        self.event_bus.publish(StoreEvent::ProductChanged {
            shop_id: shop,
            product_id: id.to_string(),
            change,
            timestamp: Utc::now(),
        });
    }

    // ── Public views ───────────────────────────────────────────────────────

    /// Loads the public storefront of the shop named `name`: the shop and
    /// its active products. The cache is not touched.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`]; an unpublished shop is
    /// [`ErrorKind::NotFound`].
    pub async fn storefront(&self, name: &str, signer: &Signer) -> Result<Storefront, StoreError> {
        let outcome = async {
            let address = self.chain.shop_by_name(signer, name).await?;
            let (details, published) = try_join(
                self.chain.shop_details(signer, address),
                self.chain.is_published(signer, address),
            )
            .await?;
            if !published {
                return Err(ChainError::not_found(format!("shop {name} is not published")));
            }
            let items = self.chain.all_items(signer, address).await?;
            Ok::<_, ChainError>((Shop::from_details(address, details, published), items))
        }
        .await;

        let (shop, items) = match outcome {
            Ok(found) => found,
            Err(err) => return Err(self.chain_failure(Operation::LoadStorefront, None, err).await),
        };
        let products = match items
            .into_iter()
            .filter(|item| item.is_active)
            .map(|item| Product::from_chain(shop.id, item))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(products) => products,
            Err(err) => {
                return Err(self
                    .price_failure(Operation::LoadStorefront, shop.id, &err)
                    .await);
            }
        };
        Ok(Storefront { shop, products })
    }

    /// Sums the sales of every known shop owned by `owner`.
    ///
    /// The known shops are the cached ones; an empty cache is filled by a
    /// full sync first. Shops whose sales cannot be read are listed in
    /// [`SalesSummary::failed_shops`] and do not abort the aggregate.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`] if the cache was empty and the
    /// sync failed.
    pub async fn sales_by_owner(
        &self,
        owner: Address,
        signer: &Signer,
    ) -> Result<SalesSummary, StoreError> {
        let mut known = self.shops().await;
        if known.is_empty() {
            let synced = self.get_all_shops(signer).await;
            if let Some(error) = synced.error {
                return Err(error);
            }
            known = synced.data;
        }
        let owned: Vec<Shop> = known
            .into_iter()
            .filter(|shop| shop.owner_address == owner)
            .collect();

        let totals = join_all(
            owned
                .iter()
                .map(|shop| self.chain.total_sales(signer, shop.id)),
        )
        .await;

        let mut summary = SalesSummary {
            owner,
            total: Decimal::ZERO,
            shops: Vec::with_capacity(owned.len()),
            failed_shops: Vec::new(),
        };
        for (shop, outcome) in owned.into_iter().zip(totals) {
            let total = outcome.map_err(|err| err.message).and_then(|raw| {
                price::from_fixed_point(raw).map_err(|err| err.to_string())
            });
            match total.and_then(|total| {
                summary
                    .total
                    .checked_add(total)
                    .map(|sum| (total, sum))
                    .ok_or_else(|| "sales total overflow".to_string())
            }) {
                Ok((total, sum)) => {
                    summary.total = sum;
                    summary.shops.push(ShopSales {
                        shop_id: shop.id,
                        name: shop.name,
                        total,
                    });
                }
                Err(reason) => {
                    tracing::warn!(shop_id = %shop.id, %reason, "sales unavailable for shop");
                    summary.failed_shops.push(shop.id);
                }
            }
        }
        Ok(summary)
    }

    // ── Session ────────────────────────────────────────────────────────────

    /// Ends the session: drops cached shops and products and the recorded
    /// error. The hidden set is durable and stays.
    pub async fn end_session(&self) {
        self.catalog.write().await.clear();
        self.clear_error().await;
        tracing::info!("session ended");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use super::*;
    use crate::chain::InMemoryChain;
    use crate::persistence::MemoryDeletedShops;

    struct Fixture {
        chain: Arc<InMemoryChain>,
        deleted: Arc<MemoryDeletedShops>,
        store: SyncStore,
        signer: Signer,
    }

    fn signer(byte: u8) -> Signer {
        Signer::new(Address::from_bytes([byte; 20]))
    }

    async fn open(chain: &Arc<InMemoryChain>, deleted: &Arc<MemoryDeletedShops>) -> SyncStore {
        let chain: Arc<dyn ChainClient> = Arc::clone(chain) as Arc<dyn ChainClient>;
        let deleted: Arc<dyn DeletedShopStore> = Arc::clone(deleted) as Arc<dyn DeletedShopStore>;
        SyncStore::open(chain, deleted, EventBus::new(64)).await
    }

    async fn fixture() -> Fixture {
        let chain = Arc::new(InMemoryChain::new());
        let deleted = Arc::new(MemoryDeletedShops::new());
        let store = open(&chain, &deleted).await;
        Fixture {
            chain,
            deleted,
            store,
            signer: signer(0xaa),
        }
    }

    async fn create(f: &Fixture, name: &str) -> Shop {
        let Ok(shop) = f
            .store
            .create_shop(name, "minimal", "a shop", "{}", &f.signer)
            .await
        else {
            panic!("create_shop {name} failed");
        };
        shop
    }

    fn draft(name: &str, price: &str, stock: u64) -> ProductDraft {
        let Ok(price) = Decimal::from_str(price) else {
            panic!("bad price literal");
        };
        ProductDraft {
            name: name.to_string(),
            description: String::new(),
            price,
            stock,
            images: vec!["bafyimage".to_string()],
            metadata: Default::default(),
        }
    }

    fn item_input(name: &str) -> crate::chain::ItemInput {
        crate::chain::ItemInput {
            name: name.to_string(),
            price: 1,
            stock: 1,
            description: String::new(),
            ipfs_hashes: Vec::new(),
        }
    }

    fn ids(shops: &[Shop]) -> Vec<ShopAddress> {
        let mut ids: Vec<_> = shops.iter().map(|s| s.id).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn created_ids_match_registry_lookup() {
        let f = fixture().await;
        for name in ["alpha", "beta", "gamma"] {
            let shop = create(&f, name).await;
            let Ok(resolved) = f.chain.shop_by_name(&f.signer, name).await else {
                panic!("lookup failed");
            };
            assert_eq!(shop.id, resolved);
            assert_eq!(shop.name, name);
            assert_eq!(shop.owner_address, f.signer.address());
            assert_eq!(shop.thumbnail, PLACEHOLDER_THUMBNAIL_CID);
        }
        assert_eq!(f.store.shops().await.len(), 3);
    }

    #[tokio::test]
    async fn repeated_sync_returns_same_ids() {
        let f = fixture().await;
        create(&f, "a").await;
        create(&f, "b").await;
        let first = f.store.get_all_shops(&f.signer).await;
        let second = f.store.get_all_shops(&f.signer).await;
        assert!(first.is_fresh() && second.is_fresh());
        assert_eq!(ids(&first.data), ids(&second.data));
        assert_eq!(first.data.len(), 2);
    }

    #[tokio::test]
    async fn hidden_shop_stays_hidden_across_reload() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        create(&f, "other").await;
        assert!(f.store.delete_store(shop.id).await.is_ok());

        let synced = f.store.get_all_shops(&f.signer).await;
        assert!(!ids(&synced.data).contains(&shop.id));

        let reloaded = open(&f.chain, &f.deleted).await;
        let synced = reloaded.get_all_shops(&f.signer).await;
        assert_eq!(synced.data.len(), 1);
        assert!(!ids(&synced.data).contains(&shop.id));
        assert_eq!(reloaded.hidden_shops().await, vec![shop.id]);

        let restored = reloaded.restore_store(shop.id, &f.signer).await;
        assert!(ids(&restored.data).contains(&shop.id));
        assert!(reloaded.hidden_shops().await.is_empty());
    }

    #[tokio::test]
    async fn delete_is_local_and_idempotent() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        assert!(f.store.add_product(shop.id, draft("x", "1", 1), &f.signer).await.is_ok());

        assert!(f.store.delete_store(shop.id).await.is_ok());
        assert!(f.store.delete_store(shop.id).await.is_ok());
        assert!(f.store.get_shop(shop.id).await.is_none());
        assert!(f.store.cached_products(shop.id).await.is_empty());
        assert_eq!(f.chain.shop_count().await, 1);
        assert_eq!(f.store.hidden_shops().await, vec![shop.id]);
    }

    #[tokio::test]
    async fn product_fetch_is_stable_and_scoped() {
        let f = fixture().await;
        let a = create(&f, "a").await;
        let b = create(&f, "b").await;
        assert!(f.store.add_product(a.id, draft("one", "1.5", 1), &f.signer).await.is_ok());
        assert!(f.store.add_product(b.id, draft("two", "2", 2), &f.signer).await.is_ok());

        let b_before = f.store.get_products(b.id, &f.signer).await;
        let first = f.store.get_products(a.id, &f.signer).await;
        let second = f.store.get_products(a.id, &f.signer).await;
        assert_eq!(first.data, second.data);
        assert_eq!(f.store.cached_products(b.id).await, b_before.data);
    }

    #[tokio::test]
    async fn fetch_replaces_even_with_empty_result() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        assert!(f.store.add_product(shop.id, draft("x", "1", 1), &f.signer).await.is_ok());
        assert!(f.store.get_products(shop.id, &f.signer).await.is_fresh());
        assert!(f.chain.delete_item(&f.signer, shop.id, 1).await.is_ok());

        let fetched = f.store.get_products(shop.id, &f.signer).await;
        assert!(fetched.data.is_empty());
        assert!(f.store.cached_products(shop.id).await.is_empty());
    }

    #[tokio::test]
    async fn pending_product_is_replaced_by_confirmed() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        let Ok(added) = f.store.add_product(shop.id, draft("Widget", "9.99", 3), &f.signer).await
        else {
            panic!("add_product failed");
        };
        assert!(added.id.is_pending());

        let fetched = f.store.get_products(shop.id, &f.signer).await;
        let [product] = fetched.data.as_slice() else {
            panic!("expected exactly one product");
        };
        assert_eq!(product.id, ProductId::Confirmed { chain_id: 1 });
        let cached = f.store.cached_products(shop.id).await;
        assert_eq!(cached.len(), 1);
        assert!(cached.iter().all(|p| !p.id.is_pending()));
    }

    #[tokio::test]
    async fn hiding_during_sync_keeps_shop_out() {
        let f = fixture().await;
        let a = create(&f, "a").await;
        let b = create(&f, "b").await;
        // the registry listing returns at once, resolving "a" is slow
        f.chain.delay_next(Duration::ZERO).await;
        f.chain.delay_next(Duration::from_millis(200)).await;

        let (synced, hidden) = tokio::join!(f.store.get_all_shops(&f.signer), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            f.store.delete_store(a.id).await
        });
        assert!(hidden.is_ok());
        assert_eq!(ids(&synced.data), vec![b.id]);
        assert!(f.store.get_shop(a.id).await.is_none());
        assert_eq!(f.store.hidden_shops().await, vec![a.id]);
        assert_eq!(ids(&f.store.get_all_shops(&f.signer).await.data), vec![b.id]);
    }

    #[tokio::test]
    async fn created_shop_reads_publication_from_chain() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        assert!(!shop.is_published);

        // create, resolve and details pass; the publication read fails
        for _ in 0..3 {
            f.chain.pass_next().await;
        }
        f.chain
            .inject_failure(ChainError::new(ErrorKind::Network, "down"))
            .await;
        let Err(err) = f
            .store
            .create_shop("second", "minimal", "", "{}", &f.signer)
            .await
        else {
            panic!("create succeeded without the publication flag");
        };
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.operation, Operation::CreateShop);
        assert_eq!(ids(&f.store.shops().await), vec![shop.id]);
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let f = fixture().await;
        create(&f, "demo").await;

        let synced = f.store.get_all_shops(&f.signer).await;
        let Some(demo) = synced.data.iter().find(|s| s.name == "demo").cloned() else {
            panic!("demo missing from sync");
        };
        let id = demo.id.to_string();
        assert!(id.starts_with("0x") && id.len() == 42);

        assert!(f
            .store
            .add_product(demo.id, draft("Widget", "9.99", 3), &f.signer)
            .await
            .is_ok());
        let products = f.store.get_products(demo.id, &f.signer).await.data;
        let widgets: Vec<_> = products.iter().filter(|p| p.name == "Widget").collect();
        let [widget] = widgets.as_slice() else {
            panic!("expected exactly one Widget");
        };
        assert_eq!(widget.price, Decimal::new(999, 2));
        assert_eq!(widget.stock, 3);

        assert!(f.store.delete_store(demo.id).await.is_ok());
        let synced = f.store.get_all_shops(&f.signer).await;
        assert!(!ids(&synced.data).contains(&demo.id));

        let restored = f.store.restore_store(demo.id, &f.signer).await;
        assert!(ids(&restored.data).contains(&demo.id));
    }

    #[tokio::test]
    async fn wallet_rejection_leaves_cache_unchanged() {
        let f = fixture().await;
        create(&f, "existing").await;
        let before = f.store.shops().await.len();

        f.chain
            .inject_failure(ChainError::from_rpc(4001, "User rejected the request."))
            .await;
        let Err(err) = f
            .store
            .create_shop("demo", "minimal", "", "{}", &f.signer)
            .await
        else {
            panic!("rejected create succeeded");
        };
        assert_eq!(err.kind, ErrorKind::UserRejected);
        assert_eq!(err.message, "Transaction was rejected by the user");
        assert_eq!(f.store.shops().await.len(), before);
        assert_eq!(f.store.last_error().await, Some(err));
    }

    #[tokio::test]
    async fn duplicate_name_is_a_generic_failure() {
        let f = fixture().await;
        create(&f, "demo").await;
        let Err(err) = f
            .store
            .create_shop("demo", "minimal", "", "{}", &f.signer)
            .await
        else {
            panic!("duplicate create succeeded");
        };
        assert_eq!(err.kind, ErrorKind::Reverted);
        assert!(err.message.starts_with("Failed to create shop:"));
        assert_eq!(f.store.shops().await.len(), 1);
    }

    #[tokio::test]
    async fn listing_failure_returns_cached_shops() {
        let f = fixture().await;
        create(&f, "a").await;
        let cached = f.store.get_all_shops(&f.signer).await.data;

        f.chain
            .inject_failure(ChainError::new(ErrorKind::Network, "connection refused"))
            .await;
        let fetched = f.store.get_all_shops(&f.signer).await;
        assert_eq!(fetched.data, cached);
        let Some(error) = fetched.error else {
            panic!("missing error");
        };
        assert_eq!(error.operation, Operation::SyncShops);
        assert_eq!(error.kind, ErrorKind::Network);
        assert!(f.store.last_error().await.is_some());
    }

    #[tokio::test]
    async fn failing_shop_is_dropped_from_sync() {
        let f = fixture().await;
        let broken = create(&f, "broken").await;
        create(&f, "fine").await;
        f.chain.fail_shop(broken.id).await;

        let fetched = f.store.get_all_shops(&f.signer).await;
        assert!(fetched.is_fresh());
        assert_eq!(fetched.data.len(), 1);
        assert!(f.store.get_shop(broken.id).await.is_none());
        assert!(f.store.last_error().await.is_none());
    }

    #[tokio::test]
    async fn product_fetch_failure_returns_cached_products() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        assert!(f.store.add_product(shop.id, draft("x", "1", 1), &f.signer).await.is_ok());
        let cached = f.store.get_products(shop.id, &f.signer).await.data;

        f.chain.fail_shop(shop.id).await;
        let fetched = f.store.get_products(shop.id, &f.signer).await;
        assert_eq!(fetched.data, cached);
        assert!(!fetched.is_fresh());
    }

    #[tokio::test]
    async fn stale_product_fetch_is_discarded() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        assert!(f.chain.add_item(&f.signer, shop.id, &item_input("first")).await.is_ok());

        f.chain.delay_next(Duration::from_millis(100)).await;
        let (slow, fast) = tokio::join!(f.store.get_products(shop.id, &f.signer), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(f.chain.add_item(&f.signer, shop.id, &item_input("second")).await.is_ok());
            f.store.get_products(shop.id, &f.signer).await
        });

        assert_eq!(slow.data.len(), 1);
        assert_eq!(fast.data.len(), 2);
        assert_eq!(f.store.cached_products(shop.id).await.len(), 2);
    }

    #[tokio::test]
    async fn rename_and_configure_updates_cache() {
        let f = fixture().await;
        let shop = create(&f, "old").await;
        let config = r##"{"theme":{"primary":"#000"},"categories":["hats"]}"##;
        assert!(f
            .store
            .update_configuration("old", shop.id, config, Some("new"), &f.signer)
            .await
            .is_ok());

        let Some(cached) = f.store.get_shop(shop.id).await else {
            panic!("shop missing");
        };
        assert_eq!(cached.name, "new");
        assert_eq!(cached.configuration, config);
        assert_eq!(cached.customization.theme.primary, "#000");
        assert_eq!(cached.customization.categories, vec!["hats".to_string()]);
        assert!(f.chain.shop_by_name(&f.signer, "new").await.is_ok());
    }

    #[tokio::test]
    async fn rename_updates_cache_and_registry() {
        let f = fixture().await;
        let shop = create(&f, "old").await;
        assert!(f
            .store
            .update_shop_name(shop.id, "old", "new", &f.signer)
            .await
            .is_ok());

        let Some(cached) = f.store.get_shop(shop.id).await else {
            panic!("shop missing");
        };
        assert_eq!(cached.name, "new");
        assert!(cached.updated_at >= shop.updated_at);
        let Ok(address) = f.chain.shop_by_name(&f.signer, "new").await else {
            panic!("new name not registered");
        };
        assert_eq!(address, shop.id);
        assert!(f.chain.shop_by_name(&f.signer, "old").await.is_err());
    }

    #[tokio::test]
    async fn rename_to_taken_name_reverts() {
        let f = fixture().await;
        let shop = create(&f, "mine").await;
        let other = create(&f, "taken").await;
        let before = f.store.shops().await;

        let Err(err) = f
            .store
            .update_shop_name(shop.id, "mine", "taken", &f.signer)
            .await
        else {
            panic!("rename onto a taken name succeeded");
        };
        assert_eq!(err.kind, ErrorKind::Reverted);
        assert_eq!(err.operation, Operation::RenameShop);
        assert_eq!(f.store.shops().await, before);
        assert_eq!(f.store.last_error().await, Some(err));
        let Ok(owner) = f.chain.shop_by_name(&f.signer, "taken").await else {
            panic!("taken name lost");
        };
        assert_eq!(owner, other.id);
    }

    #[tokio::test]
    async fn failed_configuration_after_rename_keeps_old_cached_name() {
        let f = fixture().await;
        let shop = create(&f, "old").await;
        // rename succeeds, then the configuration write fails
        f.chain.fail_shop(shop.id).await;
        let Err(err) = f
            .store
            .update_configuration("old", shop.id, "{}", Some("new"), &f.signer)
            .await
        else {
            panic!("update succeeded");
        };
        assert_eq!(err.operation, Operation::UpdateConfiguration);
        f.chain.heal_shop(shop.id).await;

        let Some(cached) = f.store.get_shop(shop.id).await else {
            panic!("shop missing");
        };
        assert_eq!(cached.name, "old");
        assert!(f.chain.shop_by_name(&f.signer, "new").await.is_ok());
    }

    #[tokio::test]
    async fn stranger_cannot_add_products() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        let Err(err) = f
            .store
            .add_product(shop.id, draft("x", "1", 1), &signer(0xbb))
            .await
        else {
            panic!("stranger added a product");
        };
        assert_eq!(err.kind, ErrorKind::NotOwner);
        assert_eq!(err.message, "Only the shop owner can modify this shop");
        assert!(f.store.cached_products(shop.id).await.is_empty());
    }

    #[tokio::test]
    async fn negative_price_is_rejected_before_the_chain() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        let Err(err) = f
            .store
            .add_product(shop.id, draft("x", "-1", 1), &f.signer)
            .await
        else {
            panic!("negative price accepted");
        };
        assert_eq!(err.kind, ErrorKind::Decode);
        let Ok(items) = f.chain.all_items(&f.signer, shop.id).await else {
            panic!("all_items failed");
        };
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_confirmed_products() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        assert!(f.store.add_product(shop.id, draft("x", "1", 1), &f.signer).await.is_ok());
        assert!(f.store.get_products(shop.id, &f.signer).await.is_fresh());

        let Ok(updated) = f
            .store
            .update_product(shop.id, 1, draft("y", "2.5", 4), &f.signer)
            .await
        else {
            panic!("update failed");
        };
        assert_eq!(updated.id, ProductId::Confirmed { chain_id: 1 });
        assert_eq!(updated.name, "y");
        assert_eq!(f.store.cached_products(shop.id).await, vec![updated]);

        assert!(f.store.delete_product(shop.id, 1, &f.signer).await.is_ok());
        assert!(f.store.cached_products(shop.id).await.is_empty());
        let Err(err) = f.store.delete_product(shop.id, 1, &f.signer).await else {
            panic!("deleted twice");
        };
        assert_eq!(err.kind, ErrorKind::Reverted);
    }

    #[tokio::test]
    async fn storefront_requires_publication() {
        let f = fixture().await;
        let shop = create(&f, "demo").await;
        assert!(f.store.add_product(shop.id, draft("x", "1", 1), &f.signer).await.is_ok());

        let Err(err) = f.store.storefront("demo", &signer(0x01)).await else {
            panic!("unpublished storefront resolved");
        };
        assert_eq!(err.kind, ErrorKind::NotFound);

        assert!(f.store.set_published(shop.id, true, &f.signer).await.is_ok());
        let Ok(front) = f.store.storefront("demo", &signer(0x01)).await else {
            panic!("published storefront missing");
        };
        assert!(front.shop.is_published);
        assert_eq!(front.products.len(), 1);
        let Some(cached) = f.store.get_shop(shop.id).await else {
            panic!("shop missing");
        };
        assert!(cached.is_published);
    }

    #[tokio::test]
    async fn sales_tolerate_failing_shops() {
        let f = fixture().await;
        let a = create(&f, "a").await;
        let b = create(&f, "b").await;
        let c = create(&f, "c").await;
        assert!(f.chain.record_sale(a.id, 1_500_000_000_000_000_000).await.is_ok());
        assert!(f.chain.record_sale(b.id, 2_000_000_000_000_000_000).await.is_ok());
        f.chain.fail_shop(c.id).await;

        let Ok(summary) = f.store.sales_by_owner(f.signer.address(), &f.signer).await else {
            panic!("sales failed");
        };
        assert_eq!(summary.total, Decimal::new(35, 1));
        assert_eq!(summary.shops.len(), 2);
        assert_eq!(summary.failed_shops, vec![c.id]);

        let Ok(other) = f.store.sales_by_owner(signer(0x02).address(), &f.signer).await else {
            panic!("sales failed");
        };
        assert_eq!(other.total, Decimal::ZERO);
        assert!(other.shops.is_empty());
    }

    #[tokio::test]
    async fn end_session_clears_cache_but_not_hidden_set() {
        let f = fixture().await;
        let shop = create(&f, "a").await;
        create(&f, "b").await;
        assert!(f.store.delete_store(shop.id).await.is_ok());
        f.chain
            .inject_failure(ChainError::new(ErrorKind::Network, "down"))
            .await;
        let _ = f.store.get_all_shops(&f.signer).await;

        f.store.end_session().await;
        assert!(f.store.shops().await.is_empty());
        assert!(f.store.last_error().await.is_none());
        assert_eq!(f.store.hidden_shops().await, vec![shop.id]);
    }

    #[tokio::test]
    async fn mutations_publish_events() {
        let f = fixture().await;
        let mut rx = f.store.event_bus().subscribe();
        let shop = create(&f, "demo").await;
        let Some(event) = rx.next().await else {
            panic!("no event");
        };
        assert_eq!(event.event_type_str(), "shop_created");
        assert_eq!(event.shop_id(), Some(shop.id));

        f.chain
            .inject_failure(ChainError::new(ErrorKind::Network, "down"))
            .await;
        let _ = f.store.get_products(shop.id, &f.signer).await;
        let Some(event) = rx.next().await else {
            panic!("no event");
        };
        assert_eq!(event.event_type_str(), "operation_failed");
    }
}
