//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the chat endpoints under a single Axum router. Anything
//! that is not an API route falls through to static files so the bundled
//! chat page can be served from the same origin.

pub mod chat;

use std::path::Path;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Room for multipart boundaries and text fields on top of the file ceiling.
/// Files between the ceiling and the body limit are rejected by the handlers.
pub const MULTIPART_SLACK_BYTES: usize = 1024 * 1024;

/// Build the full application router.
pub fn app(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.upload_limit.saturating_add(MULTIPART_SLACK_BYTES);
    let static_files = ServeDir::new(static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/chat", get(chat::list_chat))
        .route("/send", post(chat::send_text))
        .route("/send-image", post(chat::send_image))
        .route("/send-file", post(chat::send_file))
        .route("/clear-chat", post(chat::clear_chat))
        .route("/healthz", get(healthz))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
