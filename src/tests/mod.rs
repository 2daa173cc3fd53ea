//! Integration and unit tests for the Tagebuch application.
//!
//! ## Test Modules
//!
//! - **entries_api_tests**: Entry CRUD, search and tag listing
//! - **files_api_tests**: Attachment upload/download, flags, background singleton
//! - **settings_api_tests**: Settings singleton read/update
//! - **visitors_api_tests**: Visitor counter endpoints
//! - **stats_api_tests**: Aggregate statistics
//! - **auth_api_tests**: Shared-secret enforcement
//! - **health_api_tests**: Health, metrics and version endpoints
//! - **config_tests**: Configuration loading and validation
//! - **db_tests**: Schema initialization and raw queries
//! - **error_tests**: Error mapping and validation helpers

pub mod entries_api_tests;

use axum::body::Body;
use axum::http::Request;
use sqlx::sqlite::SqlitePoolOptions;

use crate::config::AppConfig;
use crate::state::AppState;

pub(crate) const TEST_AUTH_CODE: &str = "test-secret";

pub(crate) async fn test_state() -> AppState {
    test_state_with_max_bytes(10 * 1024 * 1024).await
}

pub(crate) async fn test_state_with_max_bytes(max_bytes: usize) -> AppState {
    let pool =
        SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
    crate::db::init_db(&pool).await.unwrap();

    let mut config = AppConfig::default();
    config.auth.code = TEST_AUTH_CODE.to_string();
    config.attachments.max_bytes = max_bytes;

    AppState::new(pool, config)
}

pub(crate) fn test_app(state: &AppState) -> axum::Router {
    crate::routes::build_router(state.clone())
}

pub(crate) fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-auth-code", TEST_AUTH_CODE)
        .body(Body::empty())
        .unwrap()
}

pub(crate) fn authed_delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("x-auth-code", TEST_AUTH_CODE)
        .body(Body::empty())
        .unwrap()
}

pub(crate) fn authed_json(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-auth-code", TEST_AUTH_CODE)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) const MULTIPART_BOUNDARY: &str = "tagebuchtestboundary";

/// Builds an authenticated multipart request with one file part and any
/// number of plain text parts (e.g. the voice `duration`).
pub(crate) fn multipart_request(
    uri: &str,
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
    text_parts: &[(&str, &str)],
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in text_parts {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                MULTIPART_BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            MULTIPART_BOUNDARY, field, filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY))
        .header("x-auth-code", TEST_AUTH_CODE)
        .body(Body::from(body))
        .unwrap()
}

pub(crate) async fn body_json(response: axum::response::Response) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
