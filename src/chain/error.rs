//! Chain client errors and their classification.
//!
//! Provider and contract failures are mapped onto [`ErrorKind`] here, at
//! the adapter boundary, so the synchronization store only ever branches
//! on the closed set of kinds.

use crate::error::ErrorKind;

use super::abi::AbiError;

/// EIP-1193 code for a request the user rejected.
pub const CODE_USER_REJECTED: i64 = 4001;
/// EIP-1193 code for an unauthorized (not connected) account.
pub const CODE_UNAUTHORIZED: i64 = 4100;
/// Code wallets use when a request of the same type is already pending.
pub const CODE_REQUEST_PENDING: i64 = -32002;
/// JSON-RPC code nodes use for reverted execution.
pub const CODE_EXECUTION_REVERTED: i64 = 3;

/// A failure reported by a [`super::ChainClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct ChainError {
    /// Classified kind.
    pub kind: ErrorKind,
    /// Raw provider or contract message.
    pub message: String,
}

impl ChainError {
    /// Creates an error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for [`ErrorKind::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Shorthand for [`ErrorKind::Reverted`].
    #[must_use]
    pub fn reverted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reverted, message)
    }

    /// Classifies a JSON-RPC error object by code, falling back to the
    /// known message phrases wallets and nodes use.
    #[must_use]
    pub fn from_rpc(code: i64, message: &str) -> Self {
        let kind = match code {
            CODE_USER_REJECTED => ErrorKind::UserRejected,
            CODE_UNAUTHORIZED => ErrorKind::WalletNotConnected,
            CODE_REQUEST_PENDING => ErrorKind::RequestPending,
            _ => classify_message(message).unwrap_or(if code == CODE_EXECUTION_REVERTED {
                ErrorKind::Reverted
            } else {
                ErrorKind::Network
            }),
        };
        Self::new(kind, message)
    }
}

/// Maps a provider message onto a kind using the phrases wallets and
/// contracts are known to produce.
#[must_use]
pub fn classify_message(message: &str) -> Option<ErrorKind> {
    let lower = message.to_ascii_lowercase();
    if lower.contains("wallet not connected") || lower.contains("unknown account") {
        Some(ErrorKind::WalletNotConnected)
    } else if lower.contains("already pending") || lower.contains("pending request") {
        Some(ErrorKind::RequestPending)
    } else if lower.contains("rejected") || lower.contains("user denied") {
        Some(ErrorKind::UserRejected)
    } else if lower.contains("only owner") {
        Some(ErrorKind::NotOwner)
    } else if lower.contains("execution reverted") || lower.contains("revert") {
        Some(ErrorKind::Reverted)
    } else {
        None
    }
}

impl From<AbiError> for ChainError {
    fn from(err: AbiError) -> Self {
        Self::new(ErrorKind::Decode, err.to_string())
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::new(ErrorKind::Decode, err.to_string())
        } else {
            Self::new(ErrorKind::Network, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_take_precedence() {
        assert_eq!(
            ChainError::from_rpc(4001, "whatever").kind,
            ErrorKind::UserRejected
        );
        assert_eq!(
            ChainError::from_rpc(-32002, "Request of type 'eth_requestAccounts' already pending").kind,
            ErrorKind::RequestPending
        );
        assert_eq!(
            ChainError::from_rpc(4100, "unauthorized").kind,
            ErrorKind::WalletNotConnected
        );
    }

    #[test]
    fn revert_reasons_are_classified() {
        assert_eq!(
            ChainError::from_rpc(3, "execution reverted: Only owner").kind,
            ErrorKind::NotOwner
        );
        assert_eq!(
            ChainError::from_rpc(-32000, "execution reverted: Shop name already exists").kind,
            ErrorKind::Reverted
        );
        assert_eq!(ChainError::from_rpc(3, "").kind, ErrorKind::Reverted);
    }

    #[test]
    fn unknown_messages_are_network_errors() {
        assert_eq!(
            ChainError::from_rpc(-32603, "header not found").kind,
            ErrorKind::Network
        );
    }

    #[test]
    fn message_phrases() {
        assert_eq!(
            classify_message("Wallet not connected"),
            Some(ErrorKind::WalletNotConnected)
        );
        assert_eq!(
            classify_message("MetaMask Tx Signature: User denied transaction signature."),
            Some(ErrorKind::UserRejected)
        );
        assert_eq!(
            classify_message("user rejected transaction"),
            Some(ErrorKind::UserRejected)
        );
        assert_eq!(classify_message("timeout"), None);
    }

    #[test]
    fn abi_errors_are_decode_errors() {
        let err: ChainError = AbiError::InvalidBool.into();
        assert_eq!(err.kind, ErrorKind::Decode);
    }
}
