use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::errors::{AppError, PublishError};
use crate::models::{Article, PublishResult, PublishStatus};

// ── Response DTOs ────────────────────────────────────────────

#[derive(Serialize)]
pub struct PublishResponse {
    pub success: bool,
    pub message: String,
    /// Name under which the archived copy is served by `/api/articles/:filename`.
    pub file_name: Option<String>,
    pub data: PublishResult,
}

// ── Handlers ─────────────────────────────────────────────────

pub async fn publish_article(
    State(state): State<Arc<AppState>>,
    Json(article): Json<Article>,
) -> Result<Json<PublishResponse>, AppError> {
    if article.title.trim().is_empty() {
        return Err(PublishError::invalid_argument("title must not be empty").into());
    }
    if article.body_html.trim().is_empty() {
        return Err(PublishError::invalid_argument("body_html must not be empty").into());
    }

    tracing::info!(
        title = %article.title,
        platform = state.publisher.platform(),
        "received publish request"
    );
    let result = state.publisher.publish(&article).await?;

    let message = match result.status {
        PublishStatus::Published => "article published",
        PublishStatus::ManualRequired => {
            "article saved; publish it manually on the platform"
        }
        PublishStatus::Failed => "the platform rejected the publication",
    };

    Ok(Json(PublishResponse {
        success: result.status != PublishStatus::Failed,
        message: message.to_string(),
        file_name: if result.archived { result.archive_file_name() } else { None },
        data: result,
    }))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<Value>, AppError> {
    match state.archive.read(&filename).await? {
        Some(content) => Ok(Json(json!({ "content": content }))),
        None => Err(AppError::ArticleNotFound),
    }
}
