//! Image upload DTOs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::GatewayError;
use crate::ipfs::ImageSource;

/// Request body for `POST /uploads`, tagged by `source`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum UploadRequest {
    /// A base64 `data:` URL as produced by a browser file reader.
    DataUrl {
        /// The full `data:<mime>;base64,<payload>` string.
        data_url: String,
    },
    /// A remote image fetched by the gateway before pinning.
    Url {
        /// Image URL.
        url: String,
    },
    /// Raw file contents, base64 encoded.
    Bytes {
        /// Base64 file contents.
        data_base64: String,
        /// File name reported to the pinning backend.
        file_name: String,
        /// MIME type.
        #[serde(default)]
        content_type: Option<String>,
    },
}

impl UploadRequest {
    /// Converts the request into an uploader source.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if a data URL or inline
    /// bytes cannot be decoded, or the URL is empty.
    pub fn into_source(self) -> Result<ImageSource, GatewayError> {
        match self {
            Self::DataUrl { data_url } => {
                let file = ImageSource::DataUrl(data_url)
                    .resolve_offline()
                    .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
                Ok(ImageSource::Bytes {
                    data: file.data,
                    file_name: file.file_name,
                    content_type: Some(file.content_type),
                })
            }
            Self::Url { url } if url.trim().is_empty() => Err(GatewayError::InvalidRequest(
                "url must not be empty".to_string(),
            )),
            Self::Url { url } => Ok(ImageSource::Url(url)),
            Self::Bytes {
                data_base64,
                file_name,
                content_type,
            } => {
                let data = STANDARD
                    .decode(data_base64.trim())
                    .map_err(|e| GatewayError::InvalidRequest(format!("invalid base64: {e}")))?;
                Ok(ImageSource::Bytes {
                    data,
                    file_name,
                    content_type,
                })
            }
        }
    }
}
