//! Middleware components for HTTP request processing.
//!
//! - `auth`: shared-secret check for protected routes
//! - `security_headers`: conservative security headers on every response

pub mod auth;
pub mod security_headers;
