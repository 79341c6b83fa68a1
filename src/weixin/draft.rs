//! Draft box and free-publish endpoints. These are only open to verified
//! service accounts, so the orchestrator calls them only when automated
//! publishing is switched on.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::client::PlatformClient;
use super::token::CredentialCache;
use crate::errors::PublishError;

/// One article in a `draft/add` request.
#[derive(Debug, Clone, Serialize)]
pub struct DraftArticle {
    pub title: String,
    pub digest: String,
    pub content: String,
    pub thumb_media_id: String,
    pub need_open_comment: u8,
    pub only_fans_can_comment: u8,
}

impl DraftArticle {
    pub fn new(title: &str, digest: &str, content: &str, thumb_media_id: &str) -> Self {
        Self {
            title: title.to_string(),
            digest: digest.to_string(),
            content: content.to_string(),
            thumb_media_id: thumb_media_id.to_string(),
            need_open_comment: 0,
            only_fans_can_comment: 0,
        }
    }
}

/// Result of the single status query made after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { url: String },
    InProgress,
    Failed { status: i64 },
}

#[derive(Debug, Deserialize)]
struct DraftAddReply {
    #[serde(default)]
    media_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitReply {
    #[serde(default, deserialize_with = "string_or_number")]
    publish_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusReply {
    #[serde(default)]
    publish_status: Option<i64>,
    #[serde(default)]
    article_detail: Option<ArticleDetail>,
}

#[derive(Debug, Deserialize)]
struct ArticleDetail {
    #[serde(default)]
    item: Vec<ArticleItem>,
}

#[derive(Debug, Deserialize)]
struct ArticleItem {
    #[serde(default)]
    article_url: Option<String>,
}

/// The platform has sent `publish_id` both as a string and as a number.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub struct DraftApi {
    client: PlatformClient,
    credentials: Arc<CredentialCache>,
}

impl DraftApi {
    pub fn new(client: PlatformClient, credentials: Arc<CredentialCache>) -> Self {
        Self { client, credentials }
    }

    /// Creates a draft and returns its media id.
    pub async fn add_draft(&self, article: &DraftArticle) -> Result<String, PublishError> {
        let token = self.credentials.get_token().await?;
        let reply: DraftAddReply = self
            .client
            .post_json("/cgi-bin/draft/add", &token, &json!({ "articles": [article] }))
            .await
            .map_err(|e| {
                warn!(error = %e, "draft/add rejected");
                e.into_publish_error()
            })?;

        let media_id = reply
            .media_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PublishError::publish(None, "draft/add reply carried no media_id"))?;
        info!(%media_id, "draft created");
        Ok(media_id)
    }

    /// Submits a draft for publication and returns the publish id.
    pub async fn submit(&self, draft_media_id: &str) -> Result<String, PublishError> {
        let token = self.credentials.get_token().await?;
        let reply: SubmitReply = self
            .client
            .post_json(
                "/cgi-bin/freepublish/submit",
                &token,
                &json!({ "media_id": draft_media_id }),
            )
            .await
            .map_err(|e| {
                warn!(error = %e, "freepublish/submit rejected");
                e.into_publish_error()
            })?;

        let publish_id = reply
            .publish_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                PublishError::publish(None, "freepublish/submit reply carried no publish_id")
            })?;
        info!(%publish_id, "draft submitted for publication");
        Ok(publish_id)
    }

    /// Queries the publication status once.
    pub async fn status(&self, publish_id: &str) -> Result<PublishOutcome, PublishError> {
        let token = self.credentials.get_token().await?;
        let reply: StatusReply = self
            .client
            .post_json(
                "/cgi-bin/freepublish/get",
                &token,
                &json!({ "publish_id": publish_id }),
            )
            .await
            .map_err(|e| e.into_publish_error())?;

        Ok(classify(reply))
    }
}

fn classify(reply: StatusReply) -> PublishOutcome {
    let url = reply
        .article_detail
        .and_then(|d| d.item.into_iter().find_map(|i| i.article_url))
        .filter(|u| !u.is_empty());

    match (reply.publish_status, url) {
        (Some(0), Some(url)) => PublishOutcome::Published { url },
        // Published but the detail has not propagated yet.
        (Some(0), None) | (Some(1), _) | (None, _) => PublishOutcome::InProgress,
        (Some(status), _) => PublishOutcome::Failed { status },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(json: &str) -> StatusReply {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_classify_published() {
        let outcome = classify(reply(
            r#"{"publish_status": 0, "article_detail": {"count": 1, "item": [{"idx": 1, "article_url": "https://mp.weixin.qq.com/s/abc"}]}}"#,
        ));
        assert_eq!(
            outcome,
            PublishOutcome::Published { url: "https://mp.weixin.qq.com/s/abc".into() }
        );
    }

    #[test]
    fn test_classify_in_progress() {
        assert_eq!(classify(reply(r#"{"publish_status": 1}"#)), PublishOutcome::InProgress);
        assert_eq!(classify(reply(r#"{"publish_status": 0}"#)), PublishOutcome::InProgress);
    }

    #[test]
    fn test_classify_failed() {
        assert_eq!(
            classify(reply(r#"{"publish_status": 3, "fail_idx": [1]}"#)),
            PublishOutcome::Failed { status: 3 }
        );
    }

    #[test]
    fn test_publish_id_as_number_or_string() {
        let r: SubmitReply = serde_json::from_str(r#"{"publish_id": 100000001}"#).unwrap();
        assert_eq!(r.publish_id.as_deref(), Some("100000001"));
        let r: SubmitReply = serde_json::from_str(r#"{"publish_id": "2247483"}"#).unwrap();
        assert_eq!(r.publish_id.as_deref(), Some("2247483"));
    }
}
