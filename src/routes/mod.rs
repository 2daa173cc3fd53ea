//! HTTP route handlers for the Tagebuch API.
//!
//! Each sub-module handles a specific domain of functionality:
//!
//! - `auth`: shared-secret verification for clients
//! - `entries`: diary entry CRUD, search and tag listing
//! - `files`: attachment upload, download and deletion
//! - `health`: health check, metrics snapshot and build info
//! - `settings`: display settings singleton
//! - `stats`: aggregate usage statistics
//! - `visitors`: visitor counter

pub mod auth;
pub mod entries;
pub mod files;
pub mod health;
pub mod settings;
pub mod stats;
pub mod visitors;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::error::AppError;
use crate::middleware;
use crate::state::AppState;

/// Assembles the full application router.
///
/// Everything except the visitor counter, auth verification and the
/// operational endpoints sits behind the shared-secret middleware. Outer
/// layers (tracing, CORS, compression, body limit) are applied by the
/// binary on top of this router.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/entries", get(entries::list_entries).post(entries::add_entry))
        .route("/entries/search", get(entries::search_entries))
        .route(
            "/entries/{id}",
            get(entries::get_entry).put(entries::update_entry).delete(entries::delete_entry),
        )
        .route("/entries/{id}/images", post(files::upload_image))
        .route("/entries/{id}/voice", post(files::upload_voice))
        .route("/files/{id}", get(files::get_file).delete(files::delete_file))
        .route("/tags", get(entries::list_tags))
        .route("/stats", get(stats::get_stats))
        .route("/settings", get(settings::get_settings).put(settings::update_settings))
        .route("/settings/background", post(files::upload_background))
        .route_layer(from_fn_with_state(state.config.clone(), middleware::auth::require_auth));

    let public = Router::new()
        .route("/visitors", get(visitors::get_visitors))
        .route("/visitors/increment", post(visitors::increment_visitors))
        .route("/auth", post(auth::verify_code))
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .route("/version", get(health::version));

    protected.merge(public).fallback(not_found).with_state(state)
}

/// Uniform `{"error": ...}` body for unmatched routes.
async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
