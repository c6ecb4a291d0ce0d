//! IPFS uploader: turns image bytes into content identifiers.
//!
//! [`IpfsUploader`] hides which pinning backend stores the content. All
//! backends share one signature and report failures inside the returned
//! [`UploadResult`] instead of erroring, so callers always get a result to
//! render.

pub mod gateway;
pub mod local_node;
pub mod pinata;
pub mod placeholder;

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::future::BoxFuture;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use utoipa::ToSchema;

use crate::error::ErrorKind;

pub use gateway::GatewayUploader;
pub use local_node::LocalNodeUploader;
pub use pinata::PinataUploader;
pub use placeholder::PlaceholderUploader;

/// Content type used when none is known.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors raised while preparing or pinning an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The `data:` URL could not be parsed or decoded.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// The pinning service answered with a non-success status.
    #[error("upload rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response carried no content identifier.
    #[error("response did not include a content identifier")]
    MissingHash,
}

impl UploadError {
    /// Returns the classified kind of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(err) if !err.is_decode() => ErrorKind::Network,
            _ => ErrorKind::Upload,
        }
    }
}

/// What to upload.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Raw bytes with a file name.
    Bytes {
        /// File contents.
        data: Vec<u8>,
        /// File name reported to the backend.
        file_name: String,
        /// MIME type, if known.
        content_type: Option<String>,
    },
    /// A base64 `data:` URL.
    DataUrl(String),
    /// A remote URL, fetched before uploading.
    Url(String),
}

/// A resolved file ready for pinning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// File contents.
    pub data: Vec<u8>,
    /// File name reported to the backend.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
}

impl ImageSource {
    /// Resolves the source to bytes, fetching remote URLs with `http`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError`] if a data URL is malformed or a remote
    /// fetch fails.
    pub async fn resolve(self, http: &reqwest::Client) -> Result<ImageFile, UploadError> {
        match self {
            Self::Url(url) => {
                let response = http.get(&url).send().await?.error_for_status()?;
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let data = response.bytes().await?.to_vec();
                Ok(ImageFile {
                    data,
                    file_name: file_name_from_url(&url),
                    content_type,
                })
            }
            other => other.resolve_offline(),
        }
    }

    /// Resolves sources that need no network access. Remote URLs resolve
    /// to the URL text itself.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::InvalidDataUrl`] for malformed data URLs.
    pub fn resolve_offline(self) -> Result<ImageFile, UploadError> {
        match self {
            Self::Bytes {
                data,
                file_name,
                content_type,
            } => Ok(ImageFile {
                data,
                file_name,
                content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            }),
            Self::DataUrl(url) => decode_data_url(&url),
            Self::Url(url) => Ok(ImageFile {
                file_name: file_name_from_url(&url),
                data: url.into_bytes(),
                content_type: DEFAULT_CONTENT_TYPE.to_string(),
            }),
        }
    }
}

fn decode_data_url(url: &str) -> Result<ImageFile, UploadError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| UploadError::InvalidDataUrl("missing data: prefix".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| UploadError::InvalidDataUrl("missing payload separator".to_string()))?;
    let content_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| UploadError::InvalidDataUrl("only base64 payloads are supported".to_string()))?;
    let content_type = if content_type.is_empty() {
        DEFAULT_CONTENT_TYPE
    } else {
        content_type
    };
    let data = STANDARD
        .decode(payload.trim())
        .map_err(|e| UploadError::InvalidDataUrl(e.to_string()))?;
    let extension = content_type.rsplit('/').next().unwrap_or("bin");
    Ok(ImageFile {
        data,
        file_name: format!("upload.{extension}"),
        content_type: content_type.to_string(),
    })
}

fn file_name_from_url(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("upload")
        .to_string()
}

/// Outcome of an upload, shaped for direct JSON rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UploadResult {
    /// Whether the content was pinned.
    pub success: bool,
    /// Content identifier on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Public gateway URL on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    /// Builds a successful result.
    #[must_use]
    pub fn pinned(hash: String, url: String) -> Self {
        Self {
            success: true,
            hash: Some(hash),
            url: Some(url),
            error: None,
        }
    }

    /// Builds a failed result from `err`.
    #[must_use]
    pub fn failed(err: &UploadError) -> Self {
        Self {
            success: false,
            hash: None,
            url: None,
            error: Some(err.to_string()),
        }
    }

    fn from_outcome(backend: &str, gateway: &str, outcome: Result<String, UploadError>) -> Self {
        match outcome {
            Ok(cid) => {
                tracing::info!(backend, %cid, "content pinned");
                let url = gateway_url(gateway, &cid);
                Self::pinned(cid, url)
            }
            Err(err) => {
                tracing::warn!(backend, kind = err.kind().as_str(), error = %err, "upload failed");
                Self::failed(&err)
            }
        }
    }
}

/// Joins a public gateway base and a content identifier.
#[must_use]
pub fn gateway_url(base: &str, cid: &str) -> String {
    format!("{}/{cid}", base.trim_end_matches('/'))
}

/// Stores content on IPFS and returns its identifier.
pub trait IpfsUploader: Send + Sync + fmt::Debug {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    /// Uploads `source`. Never fails; failures are reported in the
    /// result.
    fn upload<'a>(&'a self, source: ImageSource) -> BoxFuture<'a, UploadResult>;
}

/// Builds the single-file multipart form every pinning API accepts.
fn file_form(file: ImageFile) -> Result<Form, UploadError> {
    let part = Part::bytes(file.data)
        .file_name(file.file_name)
        .mime_str(&file.content_type)?;
    Ok(Form::new().part("file", part))
}

/// Posts `file` as multipart to `url` and decodes the JSON answer.
async fn post_file<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    file: ImageFile,
) -> Result<T, UploadError> {
    let mut request = http.post(url).multipart(file_form(file)?);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(UploadError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn data_url_is_decoded() {
        let source = ImageSource::DataUrl("data:image/png;base64,aGVsbG8=".to_string());
        let Ok(file) = source.resolve_offline() else {
            panic!("valid data URL rejected");
        };
        assert_eq!(file.data, b"hello");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.file_name, "upload.png");
    }

    #[test]
    fn data_url_without_base64_is_rejected() {
        let source = ImageSource::DataUrl("data:text/plain,hello".to_string());
        assert!(matches!(
            source.resolve_offline(),
            Err(UploadError::InvalidDataUrl(_))
        ));
    }

    #[test]
    fn data_url_with_bad_payload_is_rejected() {
        let source = ImageSource::DataUrl("data:image/png;base64,@@@".to_string());
        assert!(matches!(
            source.resolve_offline(),
            Err(UploadError::InvalidDataUrl(_))
        ));
    }

    #[test]
    fn bytes_default_content_type() {
        let source = ImageSource::Bytes {
            data: vec![1, 2, 3],
            file_name: "a.bin".to_string(),
            content_type: None,
        };
        let Ok(file) = source.resolve_offline() else {
            panic!("bytes rejected");
        };
        assert_eq!(file.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn url_file_names() {
        assert_eq!(file_name_from_url("https://x.io/a/cat.png?w=2"), "cat.png");
        assert_eq!(file_name_from_url("https://x.io/"), "upload");
    }

    #[test]
    fn gateway_url_joins_cleanly() {
        assert_eq!(
            gateway_url("https://ipfs.io/ipfs/", "bafy"),
            "https://ipfs.io/ipfs/bafy"
        );
    }

    #[test]
    fn failed_result_serializes_without_hash() {
        let result = UploadResult::failed(&UploadError::MissingHash);
        let Ok(json) = serde_json::to_value(&result) else {
            panic!("serialize failed");
        };
        assert_eq!(json["success"], false);
        assert!(json.get("hash").is_none());
        assert!(json["error"].is_string());
    }

    #[test]
    fn rejected_uploads_are_upload_errors() {
        let err = UploadError::Rejected {
            status: 401,
            message: "bad jwt".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Upload);
    }
}
