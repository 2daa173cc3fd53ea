use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row};

use crate::{
    db::now_utc,
    error::{AppError, AppResult},
    state::AppState,
    types::SettingsDto,
};

/// Hardcoded defaults used when the singleton is created lazily.
const DEFAULT_THEME: &str = "light";
const DEFAULT_BACKGROUND_TYPE: &str = "color";
const DEFAULT_BACKGROUND_VALUE: &str = "#ffffff";
const DEFAULT_FONT_FAMILY: &str = "sans-serif";
const DEFAULT_FONT_SIZE: &str = "medium";

/// Partial update restricted to the allow-listed fields. Unknown JSON fields
/// are silently dropped by deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSettingsRequest {
    pub theme: Option<String>,
    pub background_type: Option<String>,
    pub background_value: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<String>,
    pub accent_color: Option<String>,
}

impl UpdateSettingsRequest {
    fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.background_type.is_none()
            && self.background_value.is_none()
            && self.font_family.is_none()
            && self.font_size.is_none()
            && self.accent_color.is_none()
    }
}

fn row_to_dto(row: &SqliteRow) -> AppResult<SettingsDto> {
    Ok(SettingsDto {
        theme: row.try_get("theme")?,
        background_type: row.try_get("background_type")?,
        background_value: row.try_get("background_value")?,
        font_family: row.try_get("font_family")?,
        font_size: row.try_get("font_size")?,
        accent_color: row.try_get("accent_color")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Inserts the default settings row when none exists yet. Safe under
/// concurrent calls: the conflict clause turns the race loser into a no-op.
async fn ensure_settings_row(state: &AppState) -> AppResult<()> {
    sqlx::query(
        r#"INSERT INTO settings (id, theme, background_type, background_value, font_family, font_size, updated_at)
           VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(id) DO NOTHING"#,
    )
    .bind(DEFAULT_THEME)
    .bind(DEFAULT_BACKGROUND_TYPE)
    .bind(DEFAULT_BACKGROUND_VALUE)
    .bind(DEFAULT_FONT_FAMILY)
    .bind(DEFAULT_FONT_SIZE)
    .bind(now_utc())
    .execute(&state.db)
    .await?;
    Ok(())
}

pub async fn get_settings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    ensure_settings_row(&state).await?;
    let row = sqlx::query("SELECT * FROM settings WHERE id = 1").fetch_one(&state.db).await?;
    Ok(Json(row_to_dto(&row)?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(req): Json<UpdateSettingsRequest>,
) -> AppResult<impl IntoResponse> {
    if req.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    // Upsert semantics: create the row with defaults first, then apply the
    // partial update on top.
    ensure_settings_row(&state).await?;

    let mut qb = QueryBuilder::new("UPDATE settings SET updated_at = ");
    qb.push_bind(now_utc());
    if let Some(theme) = &req.theme {
        qb.push(", theme = ").push_bind(theme);
    }
    if let Some(background_type) = &req.background_type {
        qb.push(", background_type = ").push_bind(background_type);
    }
    if let Some(background_value) = &req.background_value {
        qb.push(", background_value = ").push_bind(background_value);
    }
    if let Some(font_family) = &req.font_family {
        qb.push(", font_family = ").push_bind(font_family);
    }
    if let Some(font_size) = &req.font_size {
        qb.push(", font_size = ").push_bind(font_size);
    }
    if let Some(accent_color) = &req.accent_color {
        qb.push(", accent_color = ").push_bind(accent_color);
    }
    qb.push(" WHERE id = 1");
    qb.build().execute(&state.db).await?;

    Ok(Json(json!({ "message": "Settings updated successfully" })))
}
