use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use sqlx::Row;

use crate::{error::AppResult, state::AppState, types::VisitorCount};

/// Returns the visitor count, 0 when the singleton has never been created.
/// Reading does not create the row.
pub async fn get_visitors(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let row = sqlx::query("SELECT count FROM visitors WHERE id = 1")
        .fetch_optional(&state.db)
        .await?;
    let count = match row {
        Some(r) => r.try_get("count")?,
        None => 0,
    };
    Ok(Json(VisitorCount { count }))
}

/// Atomic single-statement upsert: +1, created at 1 when absent. Safe under
/// arbitrary concurrency without in-process coordination.
pub async fn increment_visitors(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    sqlx::query(
        r#"INSERT INTO visitors (id, count) VALUES (1, 1)
           ON CONFLICT(id) DO UPDATE SET count = count + 1"#,
    )
    .execute(&state.db)
    .await?;

    state.metrics.inc_visits_recorded();

    Ok(Json(json!({ "message": "Visitor count incremented" })))
}
