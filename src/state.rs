use std::sync::Arc;

use crate::config::AppConfig;
use crate::metrics::Metrics;

/// The shared application state.
///
/// Cloneable and thread-safe; handed to every handler through Axum's state
/// extraction. Each request works against the pool independently - there is
/// no in-process coordination beyond SQLite's per-statement atomicity.
#[derive(Clone)]
pub struct AppState {
    /// The SQLite connection pool.
    pub db: sqlx::SqlitePool,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// Operational counters (entries written, attachments stored, ...).
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> Self {
        Self { db, config: Arc::new(config), metrics: Metrics::new() }
    }
}
