use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::constant_time_eq,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(rename = "authCode")]
    pub auth_code: String,
}

/// Lets a client verify the shared secret once up front instead of learning
/// about a wrong code on its first protected request.
pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<AuthRequest>,
) -> AppResult<impl IntoResponse> {
    if constant_time_eq(req.auth_code.as_bytes(), state.config.auth.code.as_bytes()) {
        Ok(Json(json!({ "authenticated": true })))
    } else {
        Err(AppError::Unauthorized("Unauthorized".to_string()))
    }
}
