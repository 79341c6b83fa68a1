//! Publish orchestration for the Weixin platform.
//!
//! Each attempt runs strictly in sequence: cover upload, publish (automated
//! or manual hand-off), archive. The archive copy is written on every path;
//! a failed write is logged and reported through `PublishResult::archived`
//! but never fails the attempt.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tracing::{error, info, warn};

use super::guide;
use super::ContentPublisher;
use crate::config::Config;
use crate::errors::PublishError;
use crate::models::publish::PLATFORM_NAME;
use crate::models::{Article, PublishResult};
use crate::store::{ArchiveDocument, ArchiveWriter};
use crate::weixin::{
    CredentialCache, DraftApi, DraftArticle, MediaUploader, PlatformClient, PublishOutcome,
};

/// Locally unique stand-in for a platform draft id: the current time in
/// milliseconds followed by a random suffix, both base-36.
pub fn generate_draft_id() -> Result<String, PublishError> {
    let millis = u64::try_from(Utc::now().timestamp_millis())
        .map_err(|_| PublishError::publish(None, "system clock is before the Unix epoch"))?;
    let suffix: u64 = rand::thread_rng().gen();
    Ok(format!("{}{}", to_base36(millis), to_base36(suffix)))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(13);
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

pub struct WeixinPublisher {
    credentials: Arc<CredentialCache>,
    media: MediaUploader,
    drafts: DraftApi,
    archive: ArchiveWriter,
    supports_automated_publish: bool,
}

impl WeixinPublisher {
    pub fn new(
        client: PlatformClient,
        credentials: Arc<CredentialCache>,
        archive: ArchiveWriter,
        placeholder_media_id: impl Into<String>,
        supports_automated_publish: bool,
    ) -> Self {
        Self {
            media: MediaUploader::new(client.clone(), Arc::clone(&credentials), placeholder_media_id),
            drafts: DraftApi::new(client, Arc::clone(&credentials)),
            credentials,
            archive,
            supports_automated_publish,
        }
    }

    /// Wires the client, credential cache, uploader and archive from config.
    pub fn from_config(config: &Config) -> Result<Self, PublishError> {
        let client = PlatformClient::new(config.api_base.clone())?;
        let credentials = Arc::new(CredentialCache::from_config(client.clone(), config));
        Ok(Self::new(
            client,
            credentials,
            ArchiveWriter::new(config.output_dir.clone()),
            config.default_cover_media_id.clone(),
            config.automated_publish,
        ))
    }

    pub fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }

    pub fn media(&self) -> &MediaUploader {
        &self.media
    }

    pub fn archive(&self) -> &ArchiveWriter {
        &self.archive
    }

    pub fn supports_automated_publish(&self) -> bool {
        self.supports_automated_publish
    }

    /// Publishes already-rendered HTML with a resolved cover media id.
    pub async fn publish_html(
        &self,
        article_html: &str,
        title: &str,
        digest: &str,
        cover_media_id: &str,
    ) -> Result<PublishResult, PublishError> {
        info!(
            title,
            automated = self.supports_automated_publish,
            body_chars = article_html.chars().count(),
            "publishing article"
        );

        let result = if self.supports_automated_publish {
            self.publish_automated(article_html, title, digest, cover_media_id)
                .await
        } else {
            self.publish_manual(article_html, title, digest, cover_media_id)
                .await
        };

        match &result {
            Ok(r) => info!(
                publish_id = %r.publish_id,
                status = ?r.status,
                archived = r.archived,
                "publish attempt finished"
            ),
            Err(e) => error!(kind = ?e.kind(), error = %e, "publish attempt failed"),
        }
        result
    }

    async fn publish_manual(
        &self,
        article_html: &str,
        title: &str,
        digest: &str,
        cover_media_id: &str,
    ) -> Result<PublishResult, PublishError> {
        let draft_id = generate_draft_id()?;
        info!(%draft_id, cover_media_id, "automated publishing unavailable, saved as local draft");

        let (archive_path, archived) = self.archive_article(title, digest, article_html).await;
        guide::log_manual_steps(title, digest, &archive_path);
        guide::log_preview(article_html);

        Ok(PublishResult::manual_required(draft_id, archive_path, archived))
    }

    async fn publish_automated(
        &self,
        article_html: &str,
        title: &str,
        digest: &str,
        cover_media_id: &str,
    ) -> Result<PublishResult, PublishError> {
        let draft = DraftArticle::new(title, digest, article_html, cover_media_id);
        let draft_media_id = self.drafts.add_draft(&draft).await?;
        let publish_id = self.drafts.submit(&draft_media_id).await?;

        // The submission went through; a failed status query only means a
        // human has to confirm the outcome.
        let outcome = match self.drafts.status(&publish_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%publish_id, error = %e, "publish status query failed");
                PublishOutcome::InProgress
            }
        };

        let (archive_path, archived) = self.archive_article(title, digest, article_html).await;

        Ok(match outcome {
            PublishOutcome::Published { url } => {
                PublishResult::published(publish_id, url, archive_path, archived)
            }
            PublishOutcome::InProgress => {
                info!(%publish_id, "publication still in progress; confirm it on the platform");
                guide::log_manual_steps(title, digest, &archive_path);
                PublishResult::manual_required(publish_id, archive_path, archived)
            }
            PublishOutcome::Failed { status } => {
                warn!(%publish_id, publish_status = status, "platform reported publication failure");
                PublishResult::failed(publish_id, archive_path, archived)
            }
        })
    }

    /// Writes the archive copy. Returns the target path and whether the
    /// write succeeded.
    async fn archive_article(&self, title: &str, digest: &str, body_html: &str) -> (PathBuf, bool) {
        let doc = ArchiveDocument::today(title, digest, body_html);
        match self.archive.write(&doc).await {
            Ok(path) => {
                info!(path = %path.display(), "article archived");
                (path, true)
            }
            Err(e) => {
                error!(error = %e, "failed to archive article; continuing without a local copy");
                (self.archive.path_for(&doc), false)
            }
        }
    }
}

#[async_trait]
impl ContentPublisher for WeixinPublisher {
    fn platform(&self) -> &str {
        PLATFORM_NAME
    }

    async fn publish(&self, article: &Article) -> Result<PublishResult, PublishError> {
        let cover_media_id = self.media.upload_cover_asset(article.cover_url()).await?;
        self.publish_html(&article.body_html, &article.title, &article.digest, &cover_media_id)
            .await
    }
}
