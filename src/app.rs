use axum::http::{Method, header};
use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::harvest::PropertyEngine;
use crate::routes::create_routes;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn PropertyEngine>,
    pub config: Arc<Config>,
}

/// Initialize tracing and logging for the application
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "harvest_api=info,tower_http=debug,axum::rejection=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Create and configure the Axum application with all routes and middleware
pub fn create_app(engine: Arc<dyn PropertyEngine>, config: Config) -> Router {
    info!("Initializing application router");

    let state = AppState {
        engine,
        config: Arc::new(config),
    };

    Router::new()
        .merge(create_routes())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors())
}
