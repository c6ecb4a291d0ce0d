//! Type-safe EVM addresses.
//!
//! [`Address`] is a 20-byte account or contract address. [`ShopAddress`]
//! wraps it so that shop contract ids cannot be confused with wallet
//! addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an address string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// The string does not start with `0x`.
    #[error("address must be 0x-prefixed")]
    MissingPrefix,
    /// The string does not contain exactly 40 hex digits.
    #[error("address must have 40 hex digits, got {0}")]
    InvalidLength(usize),
    /// A character is not a hex digit.
    #[error("invalid hex digit in address")]
    InvalidHex,
}

/// A 20-byte EVM address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns `true` for the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(AddressParseError::MissingPrefix)?;
        if hex.len() != 40 {
            return Err(AddressParseError::InvalidLength(hex.len()));
        }
        let mut bytes = [0u8; 20];
        for (slot, pair) in bytes.iter_mut().zip(hex.as_bytes().chunks_exact(2)) {
            let pair = std::str::from_utf8(pair).map_err(|_| AddressParseError::InvalidHex)?;
            *slot = u8::from_str_radix(pair, 16).map_err(|_| AddressParseError::InvalidHex)?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a shop: the address of its deployed shop contract.
///
/// Only produced by resolving a shop name through the registry contract
/// (or parsed from a caller-supplied path and then looked up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopAddress(Address);

impl ShopAddress {
    /// Wraps a contract address.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Returns the inner [`Address`].
    #[must_use]
    pub const fn as_address(&self) -> &Address {
        &self.0
    }
}

impl fmt::Display for ShopAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ShopAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<Address> for ShopAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl From<ShopAddress> for Address {
    fn from(id: ShopAddress) -> Self {
        id.0
    }
}
