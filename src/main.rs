use std::sync::Arc;

use harvest_api::app::{create_app, init_tracing};
use harvest_api::config::Config;
use harvest_api::harvest::HarvestClient;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    init_tracing();

    info!("Starting Harvest API...");

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded: {:?}", config);

    let engine = match HarvestClient::new(&config.harvest_url) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create homeharvest client: {:#}", e);
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address();
    let server_url = config.server_url();

    // Create the application
    let app = create_app(Arc::new(engine), config);

    // Create TCP listener
    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => {
            info!("Server running on {}", server_url);
            info!("Health check: GET /health");
            info!("Search endpoint: POST /api/scrape");
            info!("Presets endpoint: GET /api/scrape/presets");
            info!("Agents endpoint: POST /api/agents");
            listener
        }
        Err(e) => {
            error!("Failed to bind to {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };

    // Start the server
    info!("Server starting...");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    } else {
        info!("Server shutdown gracefully");
    }
}
