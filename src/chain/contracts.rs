//! Registry and shop contract bindings.
//!
//! Selectors are the first four bytes of the keccak-256 hash of each
//! function signature, listed next to the constant.

use super::abi::{self, AbiError, ParamType, Selector, Token};
use crate::domain::Address;

/// `createShop((string,string,string,string,string,address))`
pub const CREATE_SHOP: Selector = [0x10, 0xe6, 0x78, 0x26];
/// `getAllShops()`
pub const GET_ALL_SHOPS: Selector = [0xd5, 0xc9, 0xb2, 0x39];
/// `getShopByName(string)`
pub const GET_SHOP_BY_NAME: Selector = [0xe0, 0xeb, 0x33, 0xe1];
/// `updateShopName(string,string)`
pub const UPDATE_SHOP_NAME: Selector = [0x64, 0xab, 0x30, 0x61];
/// `shopDetails()`
pub const SHOP_DETAILS: Selector = [0xce, 0x74, 0x06, 0x18];
/// `isPublished()`
pub const IS_PUBLISHED: Selector = [0xb9, 0x4a, 0x4d, 0x0d];
/// `setPublished(bool)`
pub const SET_PUBLISHED: Selector = [0x06, 0xe5, 0x61, 0xfc];
/// `updateConfiguration(string,string)`
pub const UPDATE_CONFIGURATION: Selector = [0x80, 0x84, 0x16, 0x3e];
/// `addProduct((string,uint256,uint256,string,string[]))`
pub const ADD_PRODUCT: Selector = [0x2f, 0x17, 0x12, 0xcf];
/// `updateProduct(uint256,(string,uint256,uint256,string,string[]))`
pub const UPDATE_PRODUCT: Selector = [0xe2, 0xb5, 0x20, 0xdd];
/// `deleteProduct(uint256)`
pub const DELETE_PRODUCT: Selector = [0xed, 0x90, 0xc7, 0xb7];
/// `getAllItems()`
pub const GET_ALL_ITEMS: Selector = [0x4b, 0xa1, 0xd6, 0xaa];
/// `getTotalSales()`
pub const GET_TOTAL_SALES: Selector = [0x21, 0x56, 0xa9, 0x6c];

/// Shop detail record stored by every shop contract and passed to the
/// registry on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopDetails {
    /// Registry-unique name.
    pub shop_name: String,
    /// Template identifier.
    pub shop_type: String,
    /// Free-form description.
    pub description: String,
    /// Opaque configuration text (JSON by convention).
    pub configuration: String,
    /// Thumbnail content identifier.
    pub thumbnail_ipfs_hash: String,
    /// Shop owner.
    pub owner: Address,
}

/// Item fields submitted when adding or updating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInput {
    /// Product name.
    pub name: String,
    /// Fixed-point price (18 decimals).
    pub price: u128,
    /// Units in stock.
    pub stock: u128,
    /// Product description.
    pub description: String,
    /// Image content identifiers.
    pub ipfs_hashes: Vec<String>,
}

/// Item tuple returned by `getAllItems()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainItem {
    /// Per-shop sequence id.
    pub id: u128,
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Fixed-point price (18 decimals).
    pub price: u128,
    /// Units in stock.
    pub stock: u128,
    /// Whether the item is listed.
    pub is_active: bool,
    /// Unix seconds, zero if unset.
    pub created_at: u128,
    /// Unix seconds, zero if unset.
    pub updated_at: u128,
    /// Image content identifiers.
    pub ipfs_hashes: Vec<String>,
}

fn string_array(values: &[String]) -> Token {
    Token::Array(values.iter().cloned().map(Token::String).collect())
}

fn item_tuple(item: &ItemInput) -> Token {
    Token::Tuple(vec![
        Token::String(item.name.clone()),
        Token::Uint(item.price),
        Token::Uint(item.stock),
        Token::String(item.description.clone()),
        string_array(&item.ipfs_hashes),
    ])
}

// ── Registry calls ──────────────────────────────────────────────────────

/// Calldata for `createShop(details)`.
#[must_use]
pub fn encode_create_shop(details: &ShopDetails) -> Vec<u8> {
    abi::call_data(
        CREATE_SHOP,
        &[Token::Tuple(vec![
            Token::String(details.shop_name.clone()),
            Token::String(details.shop_type.clone()),
            Token::String(details.description.clone()),
            Token::String(details.configuration.clone()),
            Token::String(details.thumbnail_ipfs_hash.clone()),
            Token::Address(details.owner),
        ])],
    )
}

/// Calldata for `getAllShops()`.
#[must_use]
pub fn encode_get_all_shops() -> Vec<u8> {
    abi::call_data(GET_ALL_SHOPS, &[])
}

/// Calldata for `getShopByName(name)`.
#[must_use]
pub fn encode_get_shop_by_name(name: &str) -> Vec<u8> {
    abi::call_data(GET_SHOP_BY_NAME, &[Token::String(name.to_string())])
}

/// Calldata for `updateShopName(old, new)`.
#[must_use]
pub fn encode_update_shop_name(old_name: &str, new_name: &str) -> Vec<u8> {
    abi::call_data(
        UPDATE_SHOP_NAME,
        &[
            Token::String(old_name.to_string()),
            Token::String(new_name.to_string()),
        ],
    )
}

// ── Shop calls ──────────────────────────────────────────────────────────

/// Calldata for `shopDetails()`.
#[must_use]
pub fn encode_shop_details() -> Vec<u8> {
    abi::call_data(SHOP_DETAILS, &[])
}

/// Calldata for `isPublished()`.
#[must_use]
pub fn encode_is_published() -> Vec<u8> {
    abi::call_data(IS_PUBLISHED, &[])
}

/// Calldata for `setPublished(flag)`.
#[must_use]
pub fn encode_set_published(published: bool) -> Vec<u8> {
    abi::call_data(SET_PUBLISHED, &[Token::Bool(published)])
}

/// Calldata for `updateConfiguration(shopName, configuration)`.
#[must_use]
pub fn encode_update_configuration(shop_name: &str, configuration: &str) -> Vec<u8> {
    abi::call_data(
        UPDATE_CONFIGURATION,
        &[
            Token::String(shop_name.to_string()),
            Token::String(configuration.to_string()),
        ],
    )
}

/// Calldata for `addProduct(item)`.
#[must_use]
pub fn encode_add_product(item: &ItemInput) -> Vec<u8> {
    abi::call_data(ADD_PRODUCT, &[item_tuple(item)])
}

/// Calldata for `updateProduct(id, item)`.
#[must_use]
pub fn encode_update_product(id: u128, item: &ItemInput) -> Vec<u8> {
    abi::call_data(UPDATE_PRODUCT, &[Token::Uint(id), item_tuple(item)])
}

/// Calldata for `deleteProduct(id)`.
#[must_use]
pub fn encode_delete_product(id: u128) -> Vec<u8> {
    abi::call_data(DELETE_PRODUCT, &[Token::Uint(id)])
}

/// Calldata for `getAllItems()`.
#[must_use]
pub fn encode_get_all_items() -> Vec<u8> {
    abi::call_data(GET_ALL_ITEMS, &[])
}

/// Calldata for `getTotalSales()`.
#[must_use]
pub fn encode_get_total_sales() -> Vec<u8> {
    abi::call_data(GET_TOTAL_SALES, &[])
}

// ── Return decoding ─────────────────────────────────────────────────────

fn single(types: &[ParamType], data: &[u8]) -> Result<Token, AbiError> {
    abi::decode(types, data)?
        .into_iter()
        .next()
        .ok_or(AbiError::UnexpectedToken("return value"))
}

/// Decodes the `string[]` returned by `getAllShops()`.
///
/// # Errors
///
/// Returns an [`AbiError`] on malformed data.
pub fn decode_shop_names(data: &[u8]) -> Result<Vec<String>, AbiError> {
    single(&[ParamType::Array(Box::new(ParamType::String))], data)?
        .into_array()?
        .into_iter()
        .map(Token::into_string)
        .collect()
}

/// Decodes the `address` returned by `getShopByName(name)`.
///
/// # Errors
///
/// Returns an [`AbiError`] on malformed data.
pub fn decode_address(data: &[u8]) -> Result<Address, AbiError> {
    single(&[ParamType::Address], data)?.into_address()
}

/// Decodes a single `bool` return value.
///
/// # Errors
///
/// Returns an [`AbiError`] on malformed data.
pub fn decode_bool(data: &[u8]) -> Result<bool, AbiError> {
    single(&[ParamType::Bool], data)?.into_bool()
}

/// Decodes a single `uint256` return value.
///
/// # Errors
///
/// Returns an [`AbiError`] on malformed data.
pub fn decode_uint(data: &[u8]) -> Result<u128, AbiError> {
    single(&[ParamType::Uint], data)?.into_uint()
}

/// Decodes the six values returned by `shopDetails()`.
///
/// # Errors
///
/// Returns an [`AbiError`] on malformed data.
pub fn decode_shop_details(data: &[u8]) -> Result<ShopDetails, AbiError> {
    let types = [
        ParamType::String,
        ParamType::String,
        ParamType::String,
        ParamType::String,
        ParamType::String,
        ParamType::Address,
    ];
    let mut values = abi::decode(&types, data)?.into_iter();
    let mut next = || values.next().ok_or(AbiError::UnexpectedToken("shop field"));
    Ok(ShopDetails {
        shop_name: next()?.into_string()?,
        shop_type: next()?.into_string()?,
        description: next()?.into_string()?,
        configuration: next()?.into_string()?,
        thumbnail_ipfs_hash: next()?.into_string()?,
        owner: next()?.into_address()?,
    })
}

fn item_type() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Uint,
        ParamType::String,
        ParamType::String,
        ParamType::Uint,
        ParamType::Uint,
        ParamType::Bool,
        ParamType::Uint,
        ParamType::Uint,
        ParamType::Array(Box::new(ParamType::String)),
    ])
}

/// Decodes the item tuple array returned by `getAllItems()`.
///
/// # Errors
///
/// Returns an [`AbiError`] on malformed data.
pub fn decode_items(data: &[u8]) -> Result<Vec<ChainItem>, AbiError> {
    single(&[ParamType::Array(Box::new(item_type()))], data)?
        .into_array()?
        .into_iter()
        .map(decode_item)
        .collect()
}

fn decode_item(token: Token) -> Result<ChainItem, AbiError> {
    let mut fields = token.into_tuple()?.into_iter();
    let mut next = || fields.next().ok_or(AbiError::UnexpectedToken("item field"));
    Ok(ChainItem {
        id: next()?.into_uint()?,
        name: next()?.into_string()?,
        description: next()?.into_string()?,
        price: next()?.into_uint()?,
        stock: next()?.into_uint()?,
        is_active: next()?.into_bool()?,
        created_at: next()?.into_uint()?,
        updated_at: next()?.into_uint()?,
        ipfs_hashes: next()?
            .into_array()?
            .into_iter()
            .map(Token::into_string)
            .collect::<Result<_, _>>()?,
    })
}
