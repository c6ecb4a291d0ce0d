//! Development backend: derives a fake identifier from the content.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use super::{ImageSource, IpfsUploader, UploadResult};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Uploader that touches no network and returns a deterministic
/// identifier for each distinct content.
#[derive(Debug, Clone)]
pub struct PlaceholderUploader {
    gateway: String,
}

impl PlaceholderUploader {
    /// Creates the uploader; URLs are built on `gateway`.
    #[must_use]
    pub fn new(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
        }
    }
}

/// Identifier the placeholder backend assigns to `data`.
#[must_use]
pub fn placeholder_cid(data: &[u8]) -> String {
    let digest = data.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    });
    format!("bafyplaceholder{digest:016x}")
}

impl IpfsUploader for PlaceholderUploader {
    fn backend(&self) -> &'static str {
        "placeholder"
    }

    fn upload<'a>(&'a self, source: ImageSource) -> BoxFuture<'a, UploadResult> {
        async move {
            let outcome = source
                .resolve_offline()
                .map(|file| placeholder_cid(&file.data));
            UploadResult::from_outcome(self.backend(), &self.gateway, outcome)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_content_same_cid() {
        let uploader = PlaceholderUploader::new("https://ipfs.io/ipfs");
        let bytes = |data: &[u8]| ImageSource::Bytes {
            data: data.to_vec(),
            file_name: "a.png".to_string(),
            content_type: Some("image/png".to_string()),
        };
        let first = uploader.upload(bytes(b"abc")).await;
        let second = uploader.upload(bytes(b"abc")).await;
        let other = uploader.upload(bytes(b"abd")).await;
        assert!(first.success);
        assert_eq!(first.hash, second.hash);
        assert_ne!(first.hash, other.hash);
        assert_eq!(
            first.url,
            first.hash.map(|h| format!("https://ipfs.io/ipfs/{h}"))
        );
    }

    #[tokio::test]
    async fn invalid_data_url_reports_failure() {
        let uploader = PlaceholderUploader::new("https://ipfs.io/ipfs");
        let result = uploader
            .upload(ImageSource::DataUrl("not a data url".to_string()))
            .await;
        assert!(!result.success);
        assert!(result.hash.is_none());
        assert!(result.error.is_some());
    }
}
