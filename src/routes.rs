use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::{self, AppState};

/// Upload endpoints, without state. Callers may add layers (rate limiting)
/// before handing them to [`build_app`].
pub fn api_router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/invoices/analyze", post(handlers::analyze_invoice))
        // axum's 2MB multipart default is replaced by the configured limit
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
}

/// Final app: health check (outside any API layers) merged with the API routes.
pub fn build_app(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
