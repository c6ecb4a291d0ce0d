//! Request extractors for the signing wallet.
//!
//! The wallet account is passed in the `x-wallet-address` header, the way
//! an injected provider exposes its selected account to the page.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::chain::Signer;
use crate::domain::Address;
use crate::error::GatewayError;

/// Header carrying the caller's wallet address.
pub const WALLET_HEADER: &str = "x-wallet-address";

/// Extractor that requires a connected wallet.
///
/// Rejects with [`GatewayError::WalletNotConnected`] when the header is
/// missing, empty or the zero address.
#[derive(Debug, Clone, Copy)]
pub struct WalletSigner(pub Signer);

impl<S> FromRequestParts<S> for WalletSigner
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match header_address(parts)? {
            Some(address) if !address.is_zero() => Ok(Self(Signer::new(address))),
            _ => Err(GatewayError::WalletNotConnected),
        }
    }
}

/// Extractor for public reads: uses the caller's wallet when present and
/// the zero address otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ViewerSigner(pub Signer);

impl<S> FromRequestParts<S> for ViewerSigner
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let address = header_address(parts)?.unwrap_or_default();
        Ok(Self(Signer::new(address)))
    }
}

fn header_address(parts: &Parts) -> Result<Option<Address>, GatewayError> {
    let Some(value) = parts.headers.get(WALLET_HEADER) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|_| GatewayError::InvalidRequest(format!("{WALLET_HEADER} is not ASCII")))?
        .trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<Address>()
        .map(Some)
        .map_err(|e| GatewayError::InvalidRequest(format!("{WALLET_HEADER}: {e}")))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/shops");
        if let Some(value) = header {
            builder = builder.header(WALLET_HEADER, value);
        }
        let Ok(request) = builder.body(()) else {
            panic!("valid request");
        };
        request.into_parts().0
    }

    const WALLET: &str = "0x1111111111111111111111111111111111111111";

    #[tokio::test]
    async fn wallet_header_becomes_signer() {
        let mut parts = parts(Some(WALLET));
        let Ok(WalletSigner(signer)) = WalletSigner::from_request_parts(&mut parts, &()).await
        else {
            panic!("signer expected");
        };
        assert_eq!(signer.address().to_string(), WALLET);
    }

    #[tokio::test]
    async fn missing_or_zero_wallet_is_not_connected() {
        for header in [None, Some(""), Some("0x0000000000000000000000000000000000000000")] {
            let mut parts = parts(header);
            let result = WalletSigner::from_request_parts(&mut parts, &()).await;
            assert!(matches!(result, Err(GatewayError::WalletNotConnected)));
        }
    }

    #[tokio::test]
    async fn malformed_wallet_is_a_bad_request() {
        let mut parts = parts(Some("0x12"));
        let result = WalletSigner::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn viewer_falls_back_to_zero_address() {
        let mut parts = parts(None);
        let Ok(ViewerSigner(signer)) = ViewerSigner::from_request_parts(&mut parts, &()).await
        else {
            panic!("viewer never rejects a missing header");
        };
        assert!(signer.address().is_zero());
    }
}
