use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::publish::ContentPublisher;
use crate::store::ArchiveWriter;

pub mod handlers;

/// Shared state passed to handlers.
pub struct AppState {
    pub publisher: Arc<dyn ContentPublisher>,
    pub archive: ArchiveWriter,
}

/// Build the API router. Relative to the server root.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/publish", post(handlers::publish_article))
        .route("/articles/:filename", get(handlers::get_article))
}

/// The complete application: API, health check, static client files.
pub fn app(state: Arc<AppState>, public_dir: Option<PathBuf>) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/api", api_router())
        .with_state(state);

    if let Some(dir) = public_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(|origin, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([HeaderName::from_static("content-type")]),
        )
}
