//! Roomcast server library logic.

pub mod api_upload;
pub mod api_ws;
pub mod config;
pub mod pipeline;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use roomcast_rooms::ConnectionManager;
use roomcast_voice::{Synthesizer, Transcriber};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live device sessions and room membership.
    pub connections: ConnectionManager,
    /// Speech-to-text collaborator.
    pub transcriber: Arc<dyn Transcriber>,
    /// Text-to-speech collaborator.
    pub synthesizer: Arc<dyn Synthesizer>,
    /// Bound on a single transcription call.
    pub stt_timeout: Duration,
    /// Bound on a single synthesis call.
    pub tts_timeout: Duration,
}

/// Maximum request body size (25 MiB). Sized for multipart audio uploads;
/// everything else is tiny.
const MAX_REQUEST_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/upload", post(api_upload::upload_handler))
        .route("/ws", get(api_ws::ws_handler));

    // Serve the device demo page if the directory exists.
    // Configured via ROOMCAST_STATIC_DIR env var; defaults to "static".
    let static_dir =
        std::env::var("ROOMCAST_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
    let router = if std::path::Path::new(&static_dir).join("index.html").exists() {
        tracing::info!(path = %static_dir, "serving static files");
        let index = format!("{}/index.html", static_dir);
        router.fallback_service(ServeDir::new(&static_dir).fallback(ServeFile::new(index)))
    } else {
        tracing::info!(path = %static_dir, "static directory not found, skipping static file serving");
        router
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
