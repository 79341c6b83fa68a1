//! Image uploads to the two non-quota media classes.
//!
//! Covers go to the temporary-material endpoint (`/cgi-bin/media/upload`) and
//! come back as a media id that the platform keeps for three days. Images for
//! the article body go to `/cgi-bin/media/uploadimg` and come back as a URL
//! that can be embedded directly.

use std::sync::Arc;

use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::multipart::Part;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::client::{CallError, PlatformClient};
use super::token::CredentialCache;
use crate::errors::PublishError;
use crate::models::media::{COVER_MAX_BYTES, INLINE_MAX_BYTES};
use crate::models::{ImageFormat, MediaClass};

#[derive(Debug, Deserialize)]
struct TemporaryUploadReply {
    #[serde(default)]
    media_id: Option<String>,
    #[serde(default, rename = "type")]
    media_type: Option<String>,
    #[serde(default)]
    created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct InlineUploadReply {
    #[serde(default)]
    url: Option<String>,
}

pub struct MediaUploader {
    client: PlatformClient,
    credentials: Arc<CredentialCache>,
    placeholder_media_id: String,
}

impl MediaUploader {
    pub fn new(
        client: PlatformClient,
        credentials: Arc<CredentialCache>,
        placeholder_media_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            placeholder_media_id: placeholder_media_id.into(),
        }
    }

    pub fn placeholder_media_id(&self) -> &str {
        &self.placeholder_media_id
    }

    /// Uploads a cover image as temporary material and returns its media id.
    ///
    /// An empty `source_url` yields the pre-registered placeholder id without
    /// touching the network, so a publish always has some cover.
    pub async fn upload_cover_asset(&self, source_url: &str) -> Result<String, PublishError> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            debug!("no cover image supplied, using placeholder media id");
            return Ok(self.placeholder_media_id.clone());
        }
        validate_source_url(source_url)?;

        let token = self.credentials.get_token().await?;
        let bytes = self.fetch_source(source_url, COVER_MAX_BYTES).await?;
        let format = ImageFormat::sniff(&bytes).unwrap_or(ImageFormat::Jpeg);

        let reply: TemporaryUploadReply = self
            .client
            .post_media(
                "/cgi-bin/media/upload",
                &token,
                &[("type", "image")],
                image_part(bytes, format)?,
            )
            .await
            .map_err(|e| {
                warn!(class = %MediaClass::Temporary, error = %e, "cover upload rejected");
                e.into_upload_error()
            })?;

        let media_id = reply
            .media_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PublishError::upload(None, "media/upload reply carried no media_id"))?;

        info!(
            class = %MediaClass::Temporary,
            media_type = reply.media_type.as_deref().unwrap_or("image"),
            created_at = reply.created_at.unwrap_or_default(),
            "cover image uploaded"
        );
        Ok(media_id)
    }

    /// Uploads an image for the article body and returns its embeddable URL.
    ///
    /// When `buffer` is supplied (an already processed image) it is uploaded
    /// as-is and `source_url` is never fetched.
    pub async fn upload_inline_asset(
        &self,
        source_url: &str,
        buffer: Option<Bytes>,
    ) -> Result<String, PublishError> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            return Err(PublishError::invalid_argument("image URL must not be empty"));
        }

        let token = self.credentials.get_token().await?;
        let bytes = match buffer {
            Some(bytes) => bytes,
            None => {
                validate_source_url(source_url)?;
                self.fetch_source(source_url, INLINE_MAX_BYTES).await?
            }
        };
        let format = check_inline_image(&bytes)?;

        let reply: InlineUploadReply = self
            .client
            .post_media("/cgi-bin/media/uploadimg", &token, &[], image_part(bytes, format)?)
            .await
            .map_err(|e| {
                warn!(class = %MediaClass::InlineContent, error = %e, "inline image upload rejected");
                e.into_upload_error()
            })?;

        let url = reply
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| PublishError::upload(None, "media/uploadimg reply carried no url"))?;

        info!(class = %MediaClass::InlineContent, %url, "inline image uploaded");
        Ok(url)
    }

    async fn fetch_source(
        &self,
        source_url: &str,
        max_bytes: usize,
    ) -> Result<Bytes, PublishError> {
        let bytes = self
            .client
            .fetch_bytes(source_url, max_bytes)
            .await
            .map_err(|e| {
                warn!(source_url, error = %e, "failed to download source image");
                match e {
                    CallError::TooLarge { limit } => PublishError::invalid_argument(format!(
                        "source image is larger than the limit of {} bytes",
                        limit
                    )),
                    other => PublishError::upload(
                        None,
                        format!("failed to download source image: {}", other.detail()),
                    ),
                }
            })?;
        debug!(source_url, size = bytes.len(), "downloaded source image");
        Ok(bytes)
    }
}

fn validate_source_url(source_url: &str) -> Result<(), PublishError> {
    let parsed = url::Url::parse(source_url)
        .map_err(|e| PublishError::invalid_argument(format!("invalid image URL: {}", e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(PublishError::invalid_argument(format!(
            "unsupported image URL scheme: {}",
            other
        ))),
    }
}

/// Inline images must be JPEG or PNG and at most 1 MiB.
fn check_inline_image(bytes: &[u8]) -> Result<ImageFormat, PublishError> {
    if bytes.len() > INLINE_MAX_BYTES {
        return Err(PublishError::invalid_argument(format!(
            "inline image is {} bytes, limit is {}",
            bytes.len(),
            INLINE_MAX_BYTES
        )));
    }
    ImageFormat::sniff(bytes)
        .ok_or_else(|| PublishError::invalid_argument("inline image must be JPEG or PNG"))
}

fn image_part(bytes: Bytes, format: ImageFormat) -> Result<Part, PublishError> {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();

    Part::bytes(bytes.to_vec())
        .file_name(format!("image_{}.{}", suffix, format.extension()))
        .mime_str(format.mime())
        .map_err(|e| PublishError::upload(None, format!("invalid media part: {}", e)))
}
