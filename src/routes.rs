use crate::handlers::{agents_handler, health_check, not_found, presets_handler, search_handler};
use axum::{Router, routing::get, routing::post};

/// Creates and configures all application routes
pub fn create_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/scrape", post(search_handler))
        .route("/api/scrape/presets", get(presets_handler))
        .route("/api/agents", post(agents_handler))
        .fallback(not_found)
}
