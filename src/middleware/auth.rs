use std::sync::Arc;

use axum::{extract::Request, extract::State, middleware::Next, response::Response};

use crate::config::AppConfig;
use crate::error::AppError;

/// Header carrying the shared secret on protected routes.
pub const AUTH_HEADER: &str = "x-auth-code";

/// Middleware that compares the X-Auth-Code header against the configured
/// shared secret. Mismatch or absence yields 401; there are no tiers or
/// sessions beyond this single secret.
pub async fn require_auth(
    State(cfg): State<Arc<AppConfig>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req.headers().get(AUTH_HEADER).and_then(|h| h.to_str().ok());

    match provided {
        Some(code) if constant_time_eq(code.as_bytes(), cfg.auth.code.as_bytes()) => {
            Ok(next.run(req).await)
        }
        _ => Err(AppError::Unauthorized("Unauthorized".to_string())),
    }
}

/// Constant-time byte comparison to prevent timing attacks on the secret.
pub(crate) fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    let mut diff = 0u8;
    for (i, &b) in provided.iter().enumerate() {
        diff |= b ^ expected[i];
    }
    diff == 0
}
