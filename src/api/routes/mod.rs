//! API routes module - organizes all route handlers.

pub mod app_state;
pub mod collaboration;

use crate::config::ServerConfig;
use crate::middleware::create_cors_layer;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use app_state::{AppState, init_storage};

/// Create the application router with state and middleware applied.
pub fn create_router(app_state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(collaboration::collaboration_router())
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&config.cors_allowed_origins)),
        )
}

async fn root() -> &'static str {
    "Server is running!"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
