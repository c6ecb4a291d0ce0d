//! Per-connection subscription manager.
//!
//! Tracks which shops a WebSocket client follows and filters store events
//! server-side. Collection-wide events (those without a shop) reach only
//! wildcard subscribers.

use std::collections::HashSet;

use crate::domain::ShopAddress;

/// Shop ids parsed from a subscribe/unsubscribe command.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Targets {
    /// Well-formed shop addresses.
    pub ids: Vec<ShopAddress>,
    /// Whether `"*"` was present.
    pub wildcard: bool,
    /// Entries that are neither `"*"` nor an address.
    pub rejected: Vec<String>,
}

impl Targets {
    /// Sorts raw command entries into addresses, the wildcard and rejects.
    #[must_use]
    pub fn parse(raw: &[String]) -> Self {
        let mut targets = Self::default();
        for entry in raw {
            if entry == "*" {
                targets.wildcard = true;
            } else if let Ok(id) = entry.parse::<ShopAddress>() {
                targets.ids.push(id);
            } else {
                targets.rejected.push(entry.clone());
            }
        }
        targets
    }
}

/// Manages the set of shop subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed shops. If `subscribe_all` is true, this set is ignored.
    shop_ids: HashSet<ShopAddress>,
    /// Whether the client follows every shop (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds shops to the subscription set and optionally enables the
    /// wildcard.
    pub fn subscribe(&mut self, ids: &[ShopAddress], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.shop_ids.extend(ids.iter().copied());
    }

    /// Removes shops from the subscription set; `wildcard` turns the
    /// wildcard off.
    pub fn unsubscribe(&mut self, ids: &[ShopAddress], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.shop_ids.remove(id);
        }
    }

    /// Returns `true` if an event about `shop_id` passes the filter.
    #[must_use]
    pub fn matches(&self, shop_id: Option<ShopAddress>) -> bool {
        self.subscribe_all || shop_id.is_some_and(|id| self.shop_ids.contains(&id))
    }

    /// Returns the number of explicitly subscribed shops.
    #[must_use]
    pub fn count(&self) -> usize {
        self.shop_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
