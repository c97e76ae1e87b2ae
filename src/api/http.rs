//! HTTP server setup with Axum

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use super::websocket::ws_handler;
use crate::registry::Registry;
use crate::utils::time::rfc3339_now;

/// Create the Axum router with all endpoints.
///
/// The WebSocket upgrade and the health check share the port with the static
/// web UI, which is served for every other path.
pub fn create_router(registry: Arc<Registry>, static_dir: &Path) -> Router {
    // CORS configuration - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        // Everything else is the static web UI
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .with_state(registry)
}

/// Health check endpoint reporting the current registry size
async fn health_check(State(registry): State<Arc<Registry>>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "connections": registry.len(),
        "timestamp": rfc3339_now(),
    }))
}
