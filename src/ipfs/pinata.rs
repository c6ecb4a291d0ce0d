//! Pinata pinning service backend.
//!
//! Uploads go to `pinFileToIPFS` as a single multipart `file` field,
//! authenticated with a JWT.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{ImageSource, IpfsUploader, UploadError, UploadResult, post_file};

/// Pinata file pinning endpoint.
pub const PIN_FILE_URL: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PinResponse {
    ipfs_hash: Option<String>,
}

/// Uploader pinning through Pinata.
#[derive(Debug)]
pub struct PinataUploader {
    http: reqwest::Client,
    endpoint: String,
    jwt: SecretString,
    gateway: String,
}

impl PinataUploader {
    /// Creates an uploader using the public Pinata endpoint.
    #[must_use]
    pub fn new(jwt: SecretString, gateway: impl Into<String>) -> Self {
        Self::with_endpoint(PIN_FILE_URL, jwt, gateway)
    }

    /// Creates an uploader posting to a custom endpoint.
    #[must_use]
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        jwt: SecretString,
        gateway: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            jwt,
            gateway: gateway.into(),
        }
    }

    async fn pin(&self, source: ImageSource) -> Result<String, UploadError> {
        let file = source.resolve(&self.http).await?;
        let response: PinResponse = post_file(
            &self.http,
            &self.endpoint,
            Some(self.jwt.expose_secret()),
            file,
        )
        .await?;
        response.ipfs_hash.ok_or(UploadError::MissingHash)
    }
}

impl IpfsUploader for PinataUploader {
    fn backend(&self) -> &'static str {
        "pinata"
    }

    fn upload<'a>(&'a self, source: ImageSource) -> BoxFuture<'a, UploadResult> {
        async move {
            let outcome = self.pin(source).await;
            UploadResult::from_outcome(self.backend(), &self.gateway, outcome)
        }
        .boxed()
    }
}
