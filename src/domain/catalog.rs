//! In-memory shop and product collections of one session.
//!
//! [`Catalog`] is owned exclusively by the synchronization store, which
//! keeps it behind a single `RwLock`. Besides the two collections it
//! tracks the request tickets used to discard stale fetch completions.

use std::collections::HashMap;

use super::{Product, Shop, ShopAddress};

/// Monotonic request ticket.
pub type Ticket = u64;

/// Cached shops and products plus request sequencing state.
#[derive(Debug, Default)]
pub struct Catalog {
    shops: Vec<Shop>,
    products: Vec<Product>,
    sync_ticket: Ticket,
    product_tickets: HashMap<ShopAddress, Ticket>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all cached shops in insertion order.
    #[must_use]
    pub fn shops(&self) -> &[Shop] {
        &self.shops
    }

    /// Returns the cached shop with the given id.
    #[must_use]
    pub fn shop(&self, id: ShopAddress) -> Option<&Shop> {
        self.shops.iter().find(|s| s.id == id)
    }

    /// Returns the cached shop with the given name.
    #[must_use]
    pub fn shop_by_name(&self, name: &str) -> Option<&Shop> {
        self.shops.iter().find(|s| s.name == name)
    }

    /// Mutable access to a cached shop.
    pub fn shop_mut(&mut self, id: ShopAddress) -> Option<&mut Shop> {
        self.shops.iter_mut().find(|s| s.id == id)
    }

    /// Replaces the whole shop collection.
    pub fn replace_shops(&mut self, shops: Vec<Shop>) {
        self.shops = shops;
    }

    /// Appends a shop, replacing an existing entry with the same id.
    pub fn upsert_shop(&mut self, shop: Shop) {
        if let Some(existing) = self.shop_mut(shop.id) {
            *existing = shop;
        } else {
            self.shops.push(shop);
        }
    }

    /// Removes a shop and every cached product of it.
    ///
    /// Returns `true` if the shop was cached.
    pub fn remove_shop(&mut self, id: ShopAddress) -> bool {
        let before = self.shops.len();
        self.shops.retain(|s| s.id != id);
        self.products.retain(|p| p.store_id != id);
        self.shops.len() != before
    }

    /// Returns the cached products of one shop.
    #[must_use]
    pub fn products_for(&self, id: ShopAddress) -> Vec<Product> {
        self.products
            .iter()
            .filter(|p| p.store_id == id)
            .cloned()
            .collect()
    }

    /// Returns every cached product.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Drops every cached product of `id` and inserts `fresh` in its place.
    ///
    /// Products of other shops are untouched.
    pub fn replace_products(&mut self, id: ShopAddress, fresh: Vec<Product>) {
        self.products.retain(|p| p.store_id != id);
        self.products
            .extend(fresh.into_iter().filter(|p| p.store_id == id));
    }

    /// Appends a product.
    pub fn push_product(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Mutable access to a confirmed product.
    pub fn product_mut(&mut self, id: ShopAddress, chain_id: u128) -> Option<&mut Product> {
        self.products
            .iter_mut()
            .find(|p| p.store_id == id && p.id.chain_id() == Some(chain_id))
    }

    /// Removes a confirmed product. Returns `true` if it was cached.
    pub fn remove_product(&mut self, id: ShopAddress, chain_id: u128) -> bool {
        let before = self.products.len();
        self.products
            .retain(|p| !(p.store_id == id && p.id.chain_id() == Some(chain_id)));
        self.products.len() != before
    }

    /// Issues the next full-sync ticket.
    pub fn issue_sync_ticket(&mut self) -> Ticket {
        self.sync_ticket = self.sync_ticket.saturating_add(1);
        self.sync_ticket
    }

    /// Returns `true` if `ticket` is the most recently issued sync ticket.
    #[must_use]
    pub fn is_latest_sync(&self, ticket: Ticket) -> bool {
        self.sync_ticket == ticket
    }

    /// Issues the next product-fetch ticket for one shop.
    pub fn issue_product_ticket(&mut self, id: ShopAddress) -> Ticket {
        let ticket = self.product_tickets.entry(id).or_insert(0);
        *ticket = ticket.saturating_add(1);
        *ticket
    }

    /// Returns `true` if `ticket` is the most recently issued product-fetch
    /// ticket for `id`.
    #[must_use]
    pub fn is_latest_products(&self, id: ShopAddress, ticket: Ticket) -> bool {
        self.product_tickets.get(&id).copied() == Some(ticket)
    }

    /// Returns the number of cached shops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shops.len()
    }

    /// Returns `true` if no shops are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shops.is_empty()
    }

    /// Drops all cached data. Tickets keep counting so completions of
    /// requests issued before the reset are still recognised as stale.
    pub fn clear(&mut self) {
        self.shops.clear();
        self.products.clear();
        self.sync_ticket = self.sync_ticket.saturating_add(1);
        for ticket in self.product_tickets.values_mut() {
            *ticket = ticket.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ShopDetails;
    use crate::domain::{Address, ProductDraft, ProductMetadata};
    use rust_decimal::Decimal;

    fn addr(byte: u8) -> ShopAddress {
        ShopAddress::new(Address::from_bytes([byte; 20]))
    }

    fn make_shop(byte: u8, name: &str) -> Shop {
        let details = ShopDetails {
            shop_name: name.to_string(),
            shop_type: "minimal".to_string(),
            description: String::new(),
            configuration: "{}".to_string(),
            thumbnail_ipfs_hash: String::new(),
            owner: Address::from_bytes([0xaa; 20]),
        };
        Shop::from_details(addr(byte), details, false)
    }

    fn make_product(shop: ShopAddress, name: &str) -> Product {
        Product::pending(
            shop,
            ProductDraft {
                name: name.to_string(),
                description: String::new(),
                price: Decimal::ONE,
                stock: 1,
                images: Vec::new(),
                metadata: ProductMetadata::default(),
            },
        )
    }

    #[test]
    fn upsert_and_lookup() {
        let mut catalog = Catalog::new();
        catalog.upsert_shop(make_shop(1, "one"));
        catalog.upsert_shop(make_shop(1, "renamed"));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.shop(addr(1)).map(|s| s.name.as_str()), Some("renamed"));
        assert!(catalog.shop_by_name("renamed").is_some());
        assert!(catalog.shop(addr(2)).is_none());
    }

    #[test]
    fn remove_shop_cascades_products() {
        let mut catalog = Catalog::new();
        catalog.upsert_shop(make_shop(1, "one"));
        catalog.upsert_shop(make_shop(2, "two"));
        catalog.push_product(make_product(addr(1), "a"));
        catalog.push_product(make_product(addr(2), "b"));

        assert!(catalog.remove_shop(addr(1)));
        assert!(!catalog.remove_shop(addr(1)));
        assert!(catalog.products_for(addr(1)).is_empty());
        assert_eq!(catalog.products_for(addr(2)).len(), 1);
    }

    #[test]
    fn replace_products_only_touches_one_shop() {
        let mut catalog = Catalog::new();
        catalog.push_product(make_product(addr(1), "a"));
        catalog.push_product(make_product(addr(1), "b"));
        catalog.push_product(make_product(addr(2), "c"));

        catalog.replace_products(addr(1), vec![make_product(addr(1), "fresh")]);
        let one = catalog.products_for(addr(1));
        assert_eq!(one.len(), 1);
        assert_eq!(one.first().map(|p| p.name.as_str()), Some("fresh"));
        assert_eq!(catalog.products_for(addr(2)).len(), 1);

        catalog.replace_products(addr(1), Vec::new());
        assert!(catalog.products_for(addr(1)).is_empty());
        assert_eq!(catalog.products().len(), 1);
    }

    #[test]
    fn product_tickets_are_per_shop() {
        let mut catalog = Catalog::new();
        let first = catalog.issue_product_ticket(addr(1));
        let second = catalog.issue_product_ticket(addr(1));
        let other = catalog.issue_product_ticket(addr(2));
        assert!(!catalog.is_latest_products(addr(1), first));
        assert!(catalog.is_latest_products(addr(1), second));
        assert!(catalog.is_latest_products(addr(2), other));
    }

    #[test]
    fn clear_invalidates_outstanding_tickets() {
        let mut catalog = Catalog::new();
        let sync = catalog.issue_sync_ticket();
        let products = catalog.issue_product_ticket(addr(1));
        catalog.upsert_shop(make_shop(1, "one"));
        catalog.clear();
        assert!(catalog.is_empty());
        assert!(!catalog.is_latest_sync(sync));
        assert!(!catalog.is_latest_products(addr(1), products));
    }
}
