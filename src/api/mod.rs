//! HTTP API
//!
//! Maps HTTP requests onto storage operations and serializes the results.

pub mod handlers;
pub mod responses;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use std::sync::Arc;

use crate::middleware::logging::log_request;
use crate::storage::Sandbox;

/// Allowance for multipart boundaries, part headers and small form fields
/// on top of the file content itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Immutable state shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub sandbox: Arc<Sandbox>,
    pub max_upload_bytes: u64,
}

impl AppState {
    pub fn new(sandbox: Sandbox, max_upload_bytes: u64) -> Self {
        Self {
            sandbox: Arc::new(sandbox),
            max_upload_bytes,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD))
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(handlers::index))
        .route("/files", get(handlers::list_root))
        .route("/files/{*path}", get(handlers::list_files))
        .route("/download/{*path}", get(handlers::download_file))
        .route(
            "/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/mkdir", post(handlers::create_directory))
        .route("/delete/{*path}", delete(handlers::delete_item))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
