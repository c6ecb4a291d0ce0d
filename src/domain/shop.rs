//! Shop aggregate as cached by the synchronization store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, ShopAddress};
use crate::chain::ShopDetails;

/// Theme colors of a storefront.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeColors {
    /// Primary brand color.
    pub primary: String,
    /// Secondary/accent color.
    pub secondary: String,
    /// Page background color.
    pub background: String,
    /// Body text color.
    pub text: String,
}

/// Hero banner content of a storefront.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeroContent {
    /// Main headline.
    pub title: String,
    /// Secondary line under the headline.
    pub subtitle: String,
    /// Call-to-action button label.
    pub button_text: String,
}

/// Visual customization of a shop, decoded from its on-chain
/// `configuration` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShopCustomization {
    /// Color theme.
    pub theme: ThemeColors,
    /// Hero banner.
    pub hero: HeroContent,
    /// Product categories shown in navigation.
    pub categories: Vec<String>,
    /// Products previewed on the landing page.
    pub featured_products: Vec<String>,
    /// Full decoded configuration document.
    #[serde(skip_deserializing)]
    pub layout: serde_json::Value,
}

impl Default for ShopCustomization {
    fn default() -> Self {
        Self {
            theme: ThemeColors::default(),
            hero: HeroContent::default(),
            categories: Vec::new(),
            featured_products: Vec::new(),
            layout: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

impl ShopCustomization {
    /// Decodes an on-chain configuration string.
    ///
    /// Anything that is not a JSON object yields the default
    /// customization; known fields that are present are picked up, the
    /// rest default, and the whole document is kept in `layout`.
    #[must_use]
    pub fn from_configuration(raw: &str) -> Self {
        let Ok(layout) = serde_json::from_str::<serde_json::Value>(raw) else {
            tracing::debug!("shop configuration is not valid JSON, using defaults");
            return Self::default();
        };
        if !layout.is_object() {
            tracing::debug!("shop configuration is not a JSON object, using defaults");
            return Self::default();
        }
        let mut customization =
            serde_json::from_value::<Self>(layout.clone()).unwrap_or_default();
        customization.layout = layout;
        customization
    }
}

/// A shop ("store") backed by a deployed shop contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shop {
    /// Shop contract address (primary key).
    pub id: ShopAddress,
    /// Wallet that created the shop.
    pub owner_address: Address,
    /// Registry-unique shop name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Template the storefront was built from (on-chain `shopType`).
    pub template_id: String,
    /// Thumbnail content identifier.
    pub thumbnail: String,
    /// Raw on-chain configuration string.
    pub configuration: String,
    /// Decoded configuration.
    pub customization: ShopCustomization,
    /// Whether the public storefront resolves.
    pub is_published: bool,
    /// Client-side time the cache entry was built.
    pub created_at: DateTime<Utc>,
    /// Client-side time of the last local mutation.
    pub updated_at: DateTime<Utc>,
}

impl Shop {
    /// Builds a cache entry from the shop contract's detail tuple.
    #[must_use]
    pub fn from_details(id: ShopAddress, details: ShopDetails, is_published: bool) -> Self {
        let now = Utc::now();
        let customization = ShopCustomization::from_configuration(&details.configuration);
        Self {
            id,
            owner_address: details.owner,
            name: details.shop_name,
            description: details.description,
            template_id: details.shop_type,
            thumbnail: details.thumbnail_ipfs_hash,
            configuration: details.configuration,
            customization,
            is_published,
            created_at: now,
            updated_at: now,
        }
    }
}
