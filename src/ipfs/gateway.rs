//! Generic upload-endpoint backend.
//!
//! Posts the file to a configured upload URL (web3.storage style) that
//! answers with `{ "cid": "..." }`; the public URL is built on a gateway
//! base.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{ImageSource, IpfsUploader, UploadError, UploadResult, post_file};

#[derive(Debug, Deserialize)]
struct CidResponse {
    cid: Option<String>,
}

/// Uploader for a token-authenticated upload endpoint.
#[derive(Debug)]
pub struct GatewayUploader {
    http: reqwest::Client,
    upload_url: String,
    token: Option<SecretString>,
    gateway: String,
}

impl GatewayUploader {
    /// Creates an uploader posting to `upload_url`.
    #[must_use]
    pub fn new(
        upload_url: impl Into<String>,
        token: Option<SecretString>,
        gateway: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: upload_url.into(),
            token,
            gateway: gateway.into(),
        }
    }

    async fn pin(&self, source: ImageSource) -> Result<String, UploadError> {
        let file = source.resolve(&self.http).await?;
        let bearer = self.token.as_ref().map(|token| token.expose_secret());
        let response: CidResponse = post_file(&self.http, &self.upload_url, bearer, file).await?;
        response.cid.ok_or(UploadError::MissingHash)
    }
}

impl IpfsUploader for GatewayUploader {
    fn backend(&self) -> &'static str {
        "gateway"
    }

    fn upload<'a>(&'a self, source: ImageSource) -> BoxFuture<'a, UploadResult> {
        async move {
            let outcome = self.pin(source).await;
            UploadResult::from_outcome(self.backend(), &self.gateway, outcome)
        }
        .boxed()
    }
}
