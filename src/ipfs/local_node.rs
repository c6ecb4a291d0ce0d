//! Local IPFS node backend using the Kubo HTTP API.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Deserialize;

use super::{ImageSource, IpfsUploader, UploadError, UploadResult, post_file};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    hash: Option<String>,
}

/// Uploader adding content to a local node via `/api/v0/add`.
#[derive(Debug)]
pub struct LocalNodeUploader {
    http: reqwest::Client,
    node_url: String,
    gateway: String,
}

impl LocalNodeUploader {
    /// Creates an uploader for the node API at `node_url`
    /// (e.g. `http://127.0.0.1:5001`).
    #[must_use]
    pub fn new(node_url: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            node_url: node_url.into(),
            gateway: gateway.into(),
        }
    }

    async fn add(&self, source: ImageSource) -> Result<String, UploadError> {
        let file = source.resolve(&self.http).await?;
        let url = format!("{}/api/v0/add?pin=true", self.node_url.trim_end_matches('/'));
        let response: AddResponse = post_file(&self.http, &url, None, file).await?;
        response.hash.ok_or(UploadError::MissingHash)
    }
}

impl IpfsUploader for LocalNodeUploader {
    fn backend(&self) -> &'static str {
        "local"
    }

    fn upload<'a>(&'a self, source: ImageSource) -> BoxFuture<'a, UploadResult> {
        async move {
            let outcome = self.add(source).await;
            UploadResult::from_outcome(self.backend(), &self.gateway, outcome)
        }
        .boxed()
    }
}
