//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ErrorBody, StoreError};

/// Response body for `GET /session/error`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionErrorResponse {
    /// The most recently recorded failure of this session, if any.
    pub error: Option<StoreError>,
}

/// Maps the failure attached to a cache-fallback result onto the error
/// body list responses carry next to their data.
#[must_use]
pub fn fallback_error(error: Option<&StoreError>) -> Option<ErrorBody> {
    error.map(ErrorBody::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Operation};

    #[test]
    fn fallback_error_keeps_store_code() {
        let err = StoreError::new(Operation::SyncShops, ErrorKind::Network, "timeout");
        let body = fallback_error(Some(&err));
        assert_eq!(body.as_ref().map(|b| b.code), Some(3003));
        assert_eq!(
            body.map(|b| b.message),
            Some("Failed to fetch shops: timeout".to_string())
        );
        assert!(fallback_error(None).is_none());
    }
}
