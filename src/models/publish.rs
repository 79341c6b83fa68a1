use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PLATFORM_NAME: &str = "weixin";

/// Stands in for the article URL until someone publishes by hand.
pub const MANUAL_URL_PLACEHOLDER: &str = "fill in the article URL after publishing manually";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Published,
    ManualRequired,
    Failed,
}

/// Outcome of one publish attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub publish_id: String,
    pub status: PublishStatus,
    pub published_at: DateTime<Utc>,
    pub platform: String,
    pub url: String,
    /// Where the archive copy was (or should have been) written.
    pub archive_path: PathBuf,
    pub archived: bool,
}

impl PublishResult {
    pub fn manual_required(publish_id: String, archive_path: PathBuf, archived: bool) -> Self {
        Self {
            publish_id,
            status: PublishStatus::ManualRequired,
            published_at: Utc::now(),
            platform: PLATFORM_NAME.to_string(),
            url: MANUAL_URL_PLACEHOLDER.to_string(),
            archive_path,
            archived,
        }
    }

    pub fn published(publish_id: String, url: String, archive_path: PathBuf, archived: bool) -> Self {
        Self {
            publish_id,
            status: PublishStatus::Published,
            published_at: Utc::now(),
            platform: PLATFORM_NAME.to_string(),
            url,
            archive_path,
            archived,
        }
    }

    pub fn failed(publish_id: String, archive_path: PathBuf, archived: bool) -> Self {
        Self {
            status: PublishStatus::Failed,
            ..Self::manual_required(publish_id, archive_path, archived)
        }
    }

    /// File name of the archive copy, as served by the articles endpoint.
    pub fn archive_file_name(&self) -> Option<String> {
        self.archive_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PublishStatus::ManualRequired).unwrap();
        assert_eq!(json, "\"manual_required\"");
    }

    #[test]
    fn test_manual_required_shape() {
        let result = PublishResult::manual_required(
            "abc".into(),
            PathBuf::from("output/2026-01-01-T.html"),
            true,
        );
        assert_eq!(result.status, PublishStatus::ManualRequired);
        assert_eq!(result.platform, "weixin");
        assert_eq!(result.url, MANUAL_URL_PLACEHOLDER);
        assert_eq!(result.archive_file_name().as_deref(), Some("2026-01-01-T.html"));
    }

    #[test]
    fn test_failed_keeps_placeholder_url() {
        let result = PublishResult::failed("pid".into(), PathBuf::from("a.html"), false);
        assert_eq!(result.status, PublishStatus::Failed);
        assert_eq!(result.url, MANUAL_URL_PLACEHOLDER);
        assert!(!result.archived);
    }
}
