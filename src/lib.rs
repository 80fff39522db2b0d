pub mod agents;
pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod harvest;
pub mod models;
pub mod routes;
pub mod search;
pub mod table;

// Re-export key functions for convenience
pub use app::{create_app, init_tracing};
