pub mod guide;
pub mod orchestrator;

use async_trait::async_trait;

use crate::errors::PublishError;
use crate::models::{Article, PublishResult};

pub use orchestrator::{generate_draft_id, WeixinPublisher};

/// A destination that articles can be published to.
#[async_trait]
pub trait ContentPublisher: Send + Sync {
    /// Short platform name, as reported in [`PublishResult::platform`].
    fn platform(&self) -> &str;

    /// Resolves the cover image, publishes (or hands off for manual
    /// publication) and archives the article.
    async fn publish(&self, article: &Article) -> Result<PublishResult, PublishError>;
}
