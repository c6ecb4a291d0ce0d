//! Gateway error types with HTTP status code mapping.
//!
//! Failures are classified into a closed set of [`ErrorKind`]s at the
//! adapter boundaries (chain client, IPFS uploader, persistence). The
//! synchronization store records them as [`StoreError`]s and the REST
//! layer maps everything onto [`GatewayError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "Transaction was rejected by the user",
///     "details": "create_shop"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Closed classification of every failure the gateway can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No wallet account is available to sign.
    WalletNotConnected,
    /// The wallet already has an outstanding request.
    RequestPending,
    /// The user declined the request in the wallet.
    UserRejected,
    /// A shop contract rejected a caller that is not the shop owner.
    NotOwner,
    /// Any other contract revert (e.g. duplicate shop name).
    Reverted,
    /// The requested shop or product does not exist.
    NotFound,
    /// Transport or provider failure.
    Network,
    /// A response could not be decoded.
    Decode,
    /// An IPFS upload failed.
    Upload,
    /// The deleted-shop store could not be read or written.
    Persistence,
}

impl ErrorKind {
    /// Returns the kind as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WalletNotConnected => "wallet_not_connected",
            Self::RequestPending => "request_pending",
            Self::UserRejected => "user_rejected",
            Self::NotOwner => "not_owner",
            Self::Reverted => "reverted",
            Self::NotFound => "not_found",
            Self::Network => "network",
            Self::Decode => "decode",
            Self::Upload => "upload",
            Self::Persistence => "persistence",
        }
    }

    /// Returns `true` for wallet-side failures the user resolves in the wallet.
    #[must_use]
    pub const fn is_wallet(&self) -> bool {
        matches!(
            self,
            Self::WalletNotConnected | Self::RequestPending | Self::UserRejected
        )
    }
}

/// Store operation that produced a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Shop creation.
    CreateShop,
    /// Full registry synchronization.
    SyncShops,
    /// Product fetch for one shop.
    FetchProducts,
    /// Product addition.
    AddProduct,
    /// Product update.
    UpdateProduct,
    /// Product removal.
    DeleteProduct,
    /// Shop configuration update.
    UpdateConfiguration,
    /// Shop rename.
    RenameShop,
    /// Publish flag change.
    PublishShop,
    /// Local shop hide.
    DeleteShop,
    /// Local shop restore.
    RestoreShop,
    /// Public storefront lookup.
    LoadStorefront,
    /// Sales aggregation.
    AggregateSales,
}

impl Operation {
    /// Human phrase used in user-facing messages ("Failed to ...").
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::CreateShop => "create shop",
            Self::SyncShops => "fetch shops",
            Self::FetchProducts => "fetch products",
            Self::AddProduct => "add product",
            Self::UpdateProduct => "update product",
            Self::DeleteProduct => "delete product",
            Self::UpdateConfiguration => "update shop configuration",
            Self::RenameShop => "rename shop",
            Self::PublishShop => "change publish state",
            Self::DeleteShop => "delete shop",
            Self::RestoreShop => "restore shop",
            Self::LoadStorefront => "load storefront",
            Self::AggregateSales => "load sales",
        }
    }
}

/// A failure recorded by the synchronization store.
///
/// `message` is already phrased for the end user; `detail` keeps the raw
/// provider/contract message for logs and API consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    /// Operation that failed.
    pub operation: Operation,
    /// Classified failure kind.
    pub kind: ErrorKind,
    /// User-facing message.
    pub message: String,
    /// Raw underlying message.
    pub detail: String,
    /// When the failure was recorded.
    pub at: DateTime<Utc>,
}

impl StoreError {
    /// Builds a store error, deriving the user-facing message from `kind`.
    #[must_use]
    pub fn new(operation: Operation, kind: ErrorKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let message = match kind {
            ErrorKind::WalletNotConnected => "Please connect your wallet first".to_string(),
            ErrorKind::RequestPending => {
                "A wallet request is already pending. Please check your wallet".to_string()
            }
            ErrorKind::UserRejected => "Transaction was rejected by the user".to_string(),
            ErrorKind::NotOwner => "Only the shop owner can modify this shop".to_string(),
            _ => format!("Failed to {}: {detail}", operation.describe()),
        };
        Self {
            operation,
            kind,
            message,
            detail,
            at: Utc::now(),
        }
    }
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | Wallet / Chain  | 401 / 403 / 409 / 422        |
/// | 3000–3999 | Server          | 500 / 502                    |
/// | 4000–4999 | Not Found       | 404 Not Found                |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request carried no usable wallet address.
    #[error("wallet not connected")]
    WalletNotConnected,

    /// Shop with the given address or name is not known.
    #[error("shop not found: {0}")]
    ShopNotFound(String),

    /// Product with the given id is not known.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// A store operation failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::WalletNotConnected => 2001,
            Self::ShopNotFound(_) => 4001,
            Self::ProductNotFound(_) => 4002,
            Self::Store(err) => match err.kind {
                ErrorKind::WalletNotConnected => 2001,
                ErrorKind::RequestPending => 2002,
                ErrorKind::UserRejected => 2003,
                ErrorKind::NotOwner => 2004,
                ErrorKind::Reverted => 2005,
                ErrorKind::Decode => 3002,
                ErrorKind::Network => 3003,
                ErrorKind::Upload => 3004,
                ErrorKind::Persistence => 3005,
                ErrorKind::NotFound => 4003,
            },
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::WalletNotConnected => StatusCode::UNAUTHORIZED,
            Self::ShopNotFound(_) | Self::ProductNotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(err) => match err.kind {
                ErrorKind::WalletNotConnected => StatusCode::UNAUTHORIZED,
                ErrorKind::RequestPending => StatusCode::CONFLICT,
                ErrorKind::UserRejected | ErrorKind::Reverted => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::NotOwner => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Network | ErrorKind::Upload => StatusCode::BAD_GATEWAY,
                ErrorKind::Decode | ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the JSON body for this error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let details = match self {
            Self::Store(err) => Some(err.detail.clone()),
            _ => None,
        };
        ErrorBody {
            code: self.error_code(),
            message: self.to_string(),
            details,
        }
    }
}

impl From<&StoreError> for ErrorBody {
    fn from(err: &StoreError) -> Self {
        GatewayError::Store(err.clone()).body()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse { error: self.body() };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
