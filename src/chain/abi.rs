//! Minimal Solidity ABI codec.
//!
//! Covers exactly the types the registry and shop contracts use:
//! `address`, `uint256` (limited to values that fit a `u128`), `bool`,
//! `string`, dynamic arrays and tuples. Encoding follows the standard
//! head/tail layout; decoding is bounds-checked and never panics.

use crate::domain::Address;

/// Size of one ABI word in bytes.
pub const WORD: usize = 32;

/// Four-byte function selector.
pub type Selector = [u8; 4];

/// Errors produced while encoding or decoding ABI data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    /// A read ran past the end of the buffer.
    #[error("read of {len} bytes at offset {offset} is out of bounds")]
    OutOfBounds {
        /// Offset of the attempted read.
        offset: usize,
        /// Length of the attempted read.
        len: usize,
    },
    /// A `uint256` value does not fit in a `u128`.
    #[error("uint256 value exceeds u128")]
    Overflow,
    /// A `bool` word held something other than 0 or 1.
    #[error("invalid bool word")]
    InvalidBool,
    /// An `address` word had non-zero padding.
    #[error("invalid address word")]
    InvalidAddress,
    /// A `string` was not valid UTF-8.
    #[error("string is not valid utf-8")]
    InvalidUtf8,
    /// A hex string could not be parsed.
    #[error("invalid hex data")]
    InvalidHex,
    /// A decoded token had a different type than expected.
    #[error("expected {0}")]
    UnexpectedToken(&'static str),
}

/// A decoded or to-be-encoded ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `address`
    Address(Address),
    /// `uint256` restricted to `u128`
    Uint(u128),
    /// `bool`
    Bool(bool),
    /// `string`
    String(String),
    /// `T[]`
    Array(Vec<Token>),
    /// `(T1, T2, ...)`
    Tuple(Vec<Token>),
}

/// Type descriptor used to drive decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// `address`
    Address,
    /// `uint256`
    Uint,
    /// `bool`
    Bool,
    /// `string`
    String,
    /// `T[]`
    Array(Box<ParamType>),
    /// `(T1, T2, ...)`
    Tuple(Vec<ParamType>),
}

impl ParamType {
    fn is_dynamic(&self) -> bool {
        match self {
            Self::String | Self::Array(_) => true,
            Self::Tuple(types) => types.iter().any(Self::is_dynamic),
            Self::Address | Self::Uint | Self::Bool => false,
        }
    }

    /// Bytes this type occupies in the head of its enclosing tuple.
    fn head_size(&self) -> usize {
        match self {
            _ if self.is_dynamic() => WORD,
            Self::Tuple(types) => types.iter().map(Self::head_size).sum(),
            _ => WORD,
        }
    }
}

impl Token {
    fn is_dynamic(&self) -> bool {
        match self {
            Self::String(_) | Self::Array(_) => true,
            Self::Tuple(tokens) => tokens.iter().any(Self::is_dynamic),
            Self::Address(_) | Self::Uint(_) | Self::Bool(_) => false,
        }
    }

    fn head_size(&self) -> usize {
        match self {
            _ if self.is_dynamic() => WORD,
            Self::Tuple(tokens) => tokens.iter().map(Self::head_size).sum(),
            _ => WORD,
        }
    }

    /// Unwraps an `address`.
    ///
    /// # Errors
    ///
    /// Returns [`AbiError::UnexpectedToken`] for any other token.
    pub fn into_address(self) -> Result<Address, AbiError> {
        match self {
            Self::Address(a) => Ok(a),
            _ => Err(AbiError::UnexpectedToken("address")),
        }
    }

    /// Unwraps a `uint256`.
    ///
    /// # Errors
    ///
    /// Returns [`AbiError::UnexpectedToken`] for any other token.
    pub fn into_uint(self) -> Result<u128, AbiError> {
        match self {
            Self::Uint(v) => Ok(v),
            _ => Err(AbiError::UnexpectedToken("uint256")),
        }
    }

    /// Unwraps a `bool`.
    ///
    /// # Errors
    ///
    /// Returns [`AbiError::UnexpectedToken`] for any other token.
    pub fn into_bool(self) -> Result<bool, AbiError> {
        match self {
            Self::Bool(b) => Ok(b),
            _ => Err(AbiError::UnexpectedToken("bool")),
        }
    }

    /// Unwraps a `string`.
    ///
    /// # Errors
    ///
    /// Returns [`AbiError::UnexpectedToken`] for any other token.
    pub fn into_string(self) -> Result<String, AbiError> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(AbiError::UnexpectedToken("string")),
        }
    }

    /// Unwraps an array.
    ///
    /// # Errors
    ///
    /// Returns [`AbiError::UnexpectedToken`] for any other token.
    pub fn into_array(self) -> Result<Vec<Self>, AbiError> {
        match self {
            Self::Array(items) => Ok(items),
            _ => Err(AbiError::UnexpectedToken("array")),
        }
    }

    /// Unwraps a tuple.
    ///
    /// # Errors
    ///
    /// Returns [`AbiError::UnexpectedToken`] for any other token.
    pub fn into_tuple(self) -> Result<Vec<Self>, AbiError> {
        match self {
            Self::Tuple(items) => Ok(items),
            _ => Err(AbiError::UnexpectedToken("tuple")),
        }
    }
}

// ── Encoding ────────────────────────────────────────────────────────────

/// Builds calldata: the selector followed by the encoded arguments.
#[must_use]
pub fn call_data(selector: Selector, args: &[Token]) -> Vec<u8> {
    let mut data = selector.to_vec();
    data.extend(encode(args));
    data
}

/// Encodes a sequence of tokens as an ABI tuple.
#[must_use]
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len: usize = tokens.iter().map(Token::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
            tail.extend(encode_token(token));
        } else {
            head.extend(encode_token(token));
        }
    }
    head.extend(tail);
    head
}

fn encode_token(token: &Token) -> Vec<u8> {
    match token {
        Token::Address(address) => {
            let mut word = [0u8; WORD];
            if let Some(dst) = word.get_mut(12..) {
                dst.copy_from_slice(address.as_bytes());
            }
            word.to_vec()
        }
        Token::Uint(value) => uint_word(*value).to_vec(),
        Token::Bool(flag) => uint_word(u128::from(*flag)).to_vec(),
        Token::String(s) => {
            let bytes = s.as_bytes();
            let mut out = uint_word(bytes.len() as u128).to_vec();
            out.extend_from_slice(bytes);
            out.resize(WORD + padded_len(bytes.len()), 0);
            out
        }
        Token::Array(items) => {
            let mut out = uint_word(items.len() as u128).to_vec();
            out.extend(encode(items));
            out
        }
        Token::Tuple(items) => encode(items),
    }
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    if let Some(dst) = word.get_mut(16..) {
        dst.copy_from_slice(&value.to_be_bytes());
    }
    word
}

const fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

// ── Decoding ────────────────────────────────────────────────────────────

/// Decodes `data` as a tuple of the given types.
///
/// # Errors
///
/// Returns an [`AbiError`] on truncated, malformed or out-of-range data.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    decode_tuple(types, data, 0)
}

fn decode_tuple(types: &[ParamType], data: &[u8], base: usize) -> Result<Vec<Token>, AbiError> {
    let mut cursor = base;
    let mut tokens = Vec::with_capacity(types.len());
    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, cursor)?;
            let start = base.checked_add(offset).ok_or(AbiError::OutOfBounds {
                offset: base,
                len: offset,
            })?;
            tokens.push(decode_at(ty, data, start)?);
        } else {
            tokens.push(decode_at(ty, data, cursor)?);
        }
        cursor = cursor.saturating_add(ty.head_size());
    }
    Ok(tokens)
}

fn decode_at(ty: &ParamType, data: &[u8], at: usize) -> Result<Token, AbiError> {
    match ty {
        ParamType::Address => {
            let word = read_word(data, at)?;
            let (padding, bytes) = word.split_at(12);
            if padding.iter().any(|b| *b != 0) {
                return Err(AbiError::InvalidAddress);
            }
            let bytes: [u8; 20] = bytes.try_into().map_err(|_| AbiError::InvalidAddress)?;
            Ok(Token::Address(Address::from_bytes(bytes)))
        }
        ParamType::Uint => read_u128(data, at).map(Token::Uint),
        ParamType::Bool => match read_u128(data, at)? {
            0 => Ok(Token::Bool(false)),
            1 => Ok(Token::Bool(true)),
            _ => Err(AbiError::InvalidBool),
        },
        ParamType::String => {
            let len = read_usize(data, at)?;
            let bytes = read_bytes(data, at.saturating_add(WORD), len)?;
            String::from_utf8(bytes.to_vec())
                .map(Token::String)
                .map_err(|_| AbiError::InvalidUtf8)
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, at)?;
            let start = at.saturating_add(WORD);
            // Every element needs at least one head word.
            let remaining = data.len().saturating_sub(start);
            if len > remaining / WORD {
                return Err(AbiError::OutOfBounds {
                    offset: start,
                    len: len.saturating_mul(WORD),
                });
            }
            let types = vec![(**inner).clone(); len];
            decode_tuple(&types, data, start).map(Token::Array)
        }
        ParamType::Tuple(types) => decode_tuple(types, data, at).map(Token::Tuple),
    }
}

fn read_bytes(data: &[u8], offset: usize, len: usize) -> Result<&[u8], AbiError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(AbiError::OutOfBounds { offset, len })
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    read_bytes(data, offset, WORD)
}

fn read_u128(data: &[u8], offset: usize) -> Result<u128, AbiError> {
    let word = read_word(data, offset)?;
    let (high, low) = word.split_at(16);
    if high.iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let low: [u8; 16] = low.try_into().map_err(|_| AbiError::Overflow)?;
    Ok(u128::from_be_bytes(low))
}

fn read_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    usize::try_from(read_u128(data, offset)?).map_err(|_| AbiError::Overflow)
}

// ── Hex ─────────────────────────────────────────────────────────────────

/// Formats bytes as `0x`-prefixed lowercase hex.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Parses `0x`-prefixed (or bare) hex into bytes.
///
/// # Errors
///
/// Returns [`AbiError::InvalidHex`] on odd length or non-hex digits.
pub fn from_hex(s: &str) -> Result<Vec<u8>, AbiError> {
    let hex = s.strip_prefix("0x").unwrap_or(s);
    if hex.len() % 2 != 0 {
        return Err(AbiError::InvalidHex);
    }
    hex.as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|p| u8::from_str_radix(p, 16).ok())
                .ok_or(AbiError::InvalidHex)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        let cleaned: String = s.split_whitespace().collect();
        let Ok(bytes) = from_hex(&cleaned) else {
            panic!("valid test hex");
        };
        bytes
    }

    const STRING_ARRAY: &str = "
        0000000000000000000000000000000000000000000000000000000000000020
        0000000000000000000000000000000000000000000000000000000000000002
        0000000000000000000000000000000000000000000000000000000000000040
        0000000000000000000000000000000000000000000000000000000000000080
        0000000000000000000000000000000000000000000000000000000000000001
        6100000000000000000000000000000000000000000000000000000000000000
        0000000000000000000000000000000000000000000000000000000000000002
        6263000000000000000000000000000000000000000000000000000000000000";

    #[test]
    fn encodes_single_string_argument() {
        let data = call_data(
            [0xe0, 0xeb, 0x33, 0xe1],
            &[Token::String("demo".to_string())],
        );
        let expected = hex("e0eb33e1
            0000000000000000000000000000000000000000000000000000000000000020
            0000000000000000000000000000000000000000000000000000000000000004
            64656d6f00000000000000000000000000000000000000000000000000000000");
        assert_eq!(data, expected);
    }

    #[test]
    fn encodes_string_array() {
        let encoded = encode(&[Token::Array(vec![
            Token::String("a".to_string()),
            Token::String("bc".to_string()),
        ])]);
        assert_eq!(encoded, hex(STRING_ARRAY));
    }

    #[test]
    fn decodes_string_array() {
        let Ok(tokens) = decode(
            &[ParamType::Array(Box::new(ParamType::String))],
            &hex(STRING_ARRAY),
        ) else {
            panic!("valid data");
        };
        assert_eq!(
            tokens,
            vec![Token::Array(vec![
                Token::String("a".to_string()),
                Token::String("bc".to_string()),
            ])]
        );
    }

    #[test]
    fn encodes_static_words() {
        let owner = Address::from_bytes([0x11; 20]);
        let encoded = encode(&[Token::Address(owner), Token::Uint(5), Token::Bool(true)]);
        let expected = hex("
            0000000000000000000000001111111111111111111111111111111111111111
            0000000000000000000000000000000000000000000000000000000000000005
            0000000000000000000000000000000000000000000000000000000000000001");
        assert_eq!(encoded, expected);
    }

    #[test]
    fn dynamic_tuple_argument_gets_offset() {
        let encoded = encode(&[Token::Tuple(vec![
            Token::Uint(1),
            Token::String("x".to_string()),
        ])]);
        let expected = hex("
            0000000000000000000000000000000000000000000000000000000000000020
            0000000000000000000000000000000000000000000000000000000000000001
            0000000000000000000000000000000000000000000000000000000000000040
            0000000000000000000000000000000000000000000000000000000000000001
            7800000000000000000000000000000000000000000000000000000000000000");
        assert_eq!(encoded, expected);
    }

    #[test]
    fn truncated_data_is_rejected() {
        let data = hex(STRING_ARRAY);
        let truncated = data.get(..100).unwrap_or_default();
        let result = decode(&[ParamType::Array(Box::new(ParamType::String))], truncated);
        assert!(matches!(result, Err(AbiError::OutOfBounds { .. })));
    }

    #[test]
    fn absurd_array_length_is_rejected() {
        let data = hex("
            0000000000000000000000000000000000000000000000000000000000000020
            00000000000000000000000000000000000000000000000000000000ffffffff");
        let result = decode(&[ParamType::Array(Box::new(ParamType::Uint))], &data);
        assert!(matches!(result, Err(AbiError::OutOfBounds { .. })));
    }

    #[test]
    fn wide_uint_overflows() {
        let data = hex("0000000000000000000000000000000100000000000000000000000000000000");
        assert_eq!(decode(&[ParamType::Uint], &data), Err(AbiError::Overflow));
    }

    #[test]
    fn bad_bool_and_address_words() {
        let two = hex("0000000000000000000000000000000000000000000000000000000000000002");
        assert_eq!(decode(&[ParamType::Bool], &two), Err(AbiError::InvalidBool));
        let dirty = hex("0100000000000000000000001111111111111111111111111111111111111111");
        assert_eq!(
            decode(&[ParamType::Address], &dirty),
            Err(AbiError::InvalidAddress)
        );
    }

    #[test]
    fn hex_helpers() {
        assert_eq!(to_hex(&[0xde, 0xad, 0x01]), "0xdead01");
        assert_eq!(from_hex("0xdead01"), Ok(vec![0xde, 0xad, 0x01]));
        assert_eq!(from_hex("0xabc"), Err(AbiError::InvalidHex));
        assert_eq!(from_hex("0xzz"), Err(AbiError::InvalidHex));
        assert_eq!(from_hex("0x"), Ok(Vec::new()));
    }

    #[test]
    fn token_accessors_check_type() {
        assert_eq!(Token::Uint(3).into_uint(), Ok(3));
        assert_eq!(
            Token::Uint(3).into_string(),
            Err(AbiError::UnexpectedToken("string"))
        );
    }
}
