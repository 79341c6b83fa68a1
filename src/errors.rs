use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Coarse classification of a [`PublishError`] so callers can branch on the
/// failure without matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Authentication,
    Upload,
    InvalidArgument,
    Publish,
    Archive,
}

/// Errors raised by the publish core.
///
/// Every variant carries an opaque `detail` string. Platform rejections also
/// keep the platform's numeric `errcode` when one was returned.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("configuration error: {detail}")]
    Configuration { detail: String },

    #[error("authentication failed: {detail}")]
    Authentication { detail: String },

    #[error("upload rejected: {detail}")]
    Upload { code: Option<i64>, detail: String },

    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },

    #[error("publish failed: {detail}")]
    Publish { code: Option<i64>, detail: String },

    /// Soft failure: the orchestrator logs it and keeps going.
    #[error("archive write failed: {detail}")]
    Archive { detail: String },
}

impl PublishError {
    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::Configuration { detail: detail.into() }
    }

    pub fn authentication(detail: impl Into<String>) -> Self {
        Self::Authentication { detail: detail.into() }
    }

    pub fn upload(code: Option<i64>, detail: impl Into<String>) -> Self {
        Self::Upload { code, detail: detail.into() }
    }

    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Self::InvalidArgument { detail: detail.into() }
    }

    pub fn publish(code: Option<i64>, detail: impl Into<String>) -> Self {
        Self::Publish { code, detail: detail.into() }
    }

    pub fn archive(detail: impl Into<String>) -> Self {
        Self::Archive { detail: detail.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Upload { .. } => ErrorKind::Upload,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Publish { .. } => ErrorKind::Publish,
            Self::Archive { .. } => ErrorKind::Archive,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::Configuration { detail }
            | Self::Authentication { detail }
            | Self::Upload { detail, .. }
            | Self::InvalidArgument { detail }
            | Self::Publish { detail, .. }
            | Self::Archive { detail } => detail,
        }
    }

    /// Platform `errcode`, when the failure came from a platform reply.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Upload { code, .. } | Self::Publish { code, .. } => *code,
            _ => None,
        }
    }
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("article not found")]
    ArticleNotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::Publish(e) => match e.kind() {
                ErrorKind::Configuration => {
                    tracing::error!(error = %e, "publisher is misconfigured");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "configuration_error",
                        "configuration_error",
                        e.detail().to_string(),
                    )
                }
                ErrorKind::Authentication => (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "authentication_failed",
                    e.detail().to_string(),
                ),
                ErrorKind::Upload => (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "upload_rejected",
                    e.detail().to_string(),
                ),
                ErrorKind::InvalidArgument => (
                    StatusCode::BAD_REQUEST,
                    "invalid_request_error",
                    "invalid_argument",
                    e.detail().to_string(),
                ),
                ErrorKind::Publish => (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "publish_failed",
                    e.detail().to_string(),
                ),
                ErrorKind::Archive => {
                    tracing::error!(error = %e, "archive error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "archive_failed",
                        "archive storage error".to_string(),
                    )
                }
            },
            AppError::ArticleNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "article_not_found",
                "article not found".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_detail_accessors() {
        let err = PublishError::upload(Some(40004), "invalid media type");
        assert_eq!(err.kind(), ErrorKind::Upload);
        assert_eq!(err.detail(), "invalid media type");
        assert_eq!(err.code(), Some(40004));

        let err = PublishError::configuration("WEIXIN_APP_ID is not set");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InvalidArgument).unwrap();
        assert_eq!(json, "\"invalid_argument\"");
    }

    #[test]
    fn test_status_codes() {
        let resp = AppError::from(PublishError::invalid_argument("empty url")).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::from(PublishError::upload(Some(45009), "quota")).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = AppError::ArticleNotFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::from(PublishError::configuration("no app id")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = AppError::from(PublishError::archive("disk full")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
