use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use serde_json::json;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row};
use uuid::Uuid;

use crate::{
    db::now_utc,
    error::{validation::require_non_empty, AppError, AppResult},
    state::AppState,
    types::{EntryDetail, EntrySummary, ImageDescriptor, VoiceNoteDescriptor},
};

const SUMMARY_COLUMNS: &str = "id, date, content, mood, weather, location, tags, \
     has_images, has_voice, background, color_scheme";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntryRequest {
    pub date: Option<String>,
    pub content: Option<String>,
    pub mood: Option<String>,
    pub weather: Option<String>,
    pub tags: Option<Vec<String>>,
    pub location: Option<String>,
    pub background: Option<String>,
    pub color_scheme: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEntryRequest {
    pub content: Option<String>,
    pub mood: Option<String>,
    pub weather: Option<String>,
    pub tags: Option<Vec<String>>,
    pub location: Option<String>,
    pub background: Option<String>,
    pub color_scheme: Option<String>,
}

impl UpdateEntryRequest {
    fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.mood.is_none()
            && self.weather.is_none()
            && self.tags.is_none()
            && self.location.is_none()
            && self.background.is_none()
            && self.color_scheme.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive substring match against content OR location.
    pub q: Option<String>,
    /// Entry must contain at least one of the given tags.
    #[serde(default, alias = "tags[]")]
    pub tags: Vec<String>,
    /// Exact mood match.
    pub mood: Option<String>,
    /// Inclusive bounds, compared as text against the date field.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub(crate) fn row_to_summary(row: &SqliteRow) -> AppResult<EntrySummary> {
    let tags_json: String = row.try_get("tags")?;
    Ok(EntrySummary {
        id: row.try_get("id")?,
        date: row.try_get("date")?,
        content: row.try_get("content")?,
        mood: row.try_get("mood")?,
        weather: row.try_get("weather")?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        location: row.try_get("location")?,
        has_images: row.try_get::<i64, _>("has_images")? != 0,
        has_voice: row.try_get::<i64, _>("has_voice")? != 0,
        background: row.try_get("background")?,
        color_scheme: row.try_get("color_scheme")?,
    })
}

pub async fn list_entries(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM entries ORDER BY created_at DESC",
        SUMMARY_COLUMNS
    ))
    .fetch_all(&state.db)
    .await?;

    let entries = rows.iter().map(row_to_summary).collect::<AppResult<Vec<_>>>()?;
    Ok(Json(entries))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let row = sqlx::query(
        r#"SELECT id, date, content, mood, weather, location, tags,
                  has_images, has_voice, background, color_scheme, created_at, updated_at
           FROM entries WHERE id = ?1"#,
    )
    .bind(&id)
    .fetch_optional(&state.db)
    .await?;

    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound("Entry not found".to_string())),
    };

    let has_images = row.try_get::<i64, _>("has_images")? != 0;
    let has_voice = row.try_get::<i64, _>("has_voice")? != 0;

    let mut images = Vec::new();
    let mut voice_notes = Vec::new();
    if has_images || has_voice {
        let attachment_rows = sqlx::query(
            r#"SELECT id, kind, filename, content_type, duration, uploaded_at
               FROM attachments WHERE entry_id = ?1 AND kind IN ('image', 'voice')
               ORDER BY uploaded_at ASC"#,
        )
        .bind(&id)
        .fetch_all(&state.db)
        .await?;

        for a in &attachment_rows {
            let kind: String = a.try_get("kind")?;
            match kind.as_str() {
                "image" => images.push(ImageDescriptor {
                    id: a.try_get("id")?,
                    filename: a.try_get("filename")?,
                    content_type: a.try_get("content_type")?,
                }),
                "voice" => voice_notes.push(VoiceNoteDescriptor {
                    id: a.try_get("id")?,
                    filename: a.try_get("filename")?,
                    content_type: a.try_get("content_type")?,
                    duration: a.try_get("duration")?,
                    uploaded_at: a.try_get("uploaded_at")?,
                }),
                _ => {}
            }
        }
    }

    let tags_json: String = row.try_get("tags")?;
    let detail = EntryDetail {
        id: row.try_get("id")?,
        date: row.try_get("date")?,
        content: row.try_get("content")?,
        mood: row.try_get("mood")?,
        weather: row.try_get("weather")?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        location: row.try_get("location")?,
        has_images,
        has_voice,
        background: row.try_get("background")?,
        color_scheme: row.try_get("color_scheme")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        images,
        voice_notes,
    };

    Ok(Json(detail))
}

pub async fn add_entry(
    State(state): State<AppState>,
    Json(req): Json<CreateEntryRequest>,
) -> AppResult<impl IntoResponse> {
    let content = require_non_empty(req.content.as_deref(), "content")?;
    let date = require_non_empty(req.date.as_deref(), "date")?;

    let id = Uuid::new_v4().to_string();
    let now = now_utc();
    let tags_json = serde_json::to_string(&req.tags.clone().unwrap_or_default())
        .map_err(|e| AppError::Internal(e.into()))?;

    sqlx::query(
        r#"INSERT INTO entries
               (id, date, content, mood, weather, location, tags,
                has_images, has_voice, background, color_scheme, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0, ?8, ?9, ?10, ?10)"#,
    )
    .bind(&id)
    .bind(date)
    .bind(content)
    .bind(req.mood.as_deref().unwrap_or(""))
    .bind(req.weather.as_deref().unwrap_or(""))
    .bind(req.location.as_deref().unwrap_or(""))
    .bind(&tags_json)
    .bind(&req.background)
    .bind(&req.color_scheme)
    .bind(&now)
    .execute(&state.db)
    .await?;

    state.metrics.inc_entries_created();

    Ok((StatusCode::CREATED, Json(json!({ "id": id, "message": "Entry added successfully" }))))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEntryRequest>,
) -> AppResult<impl IntoResponse> {
    if req.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let exists = sqlx::query("SELECT id FROM entries WHERE id = ?1")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Entry not found".to_string()));
    }

    // Only supplied fields are modified; content emptiness is deliberately
    // not re-validated here, unlike at creation.
    let mut qb = QueryBuilder::new("UPDATE entries SET updated_at = ");
    qb.push_bind(now_utc());
    if let Some(content) = &req.content {
        qb.push(", content = ").push_bind(content);
    }
    if let Some(mood) = &req.mood {
        qb.push(", mood = ").push_bind(mood);
    }
    if let Some(weather) = &req.weather {
        qb.push(", weather = ").push_bind(weather);
    }
    if let Some(tags) = &req.tags {
        let tags_json = serde_json::to_string(tags).map_err(|e| AppError::Internal(e.into()))?;
        qb.push(", tags = ").push_bind(tags_json);
    }
    if let Some(location) = &req.location {
        qb.push(", location = ").push_bind(location);
    }
    if let Some(background) = &req.background {
        qb.push(", background = ").push_bind(background);
    }
    if let Some(color_scheme) = &req.color_scheme {
        qb.push(", color_scheme = ").push_bind(color_scheme);
    }
    qb.push(" WHERE id = ").push_bind(&id);
    qb.build().execute(&state.db).await?;

    state.metrics.inc_entries_updated();

    Ok(Json(json!({ "message": "Entry updated successfully" })))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let exists = sqlx::query("SELECT id FROM entries WHERE id = ?1")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Entry not found".to_string()));
    }

    // Cascade: attachments first, then the entry. Two independent writes; a
    // failure in between leaves the attachments gone and the entry present,
    // which a retried delete cleans up.
    sqlx::query("DELETE FROM attachments WHERE entry_id = ?1")
        .bind(&id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM entries WHERE id = ?1").bind(&id).execute(&state.db).await?;

    state.metrics.inc_entries_deleted();

    Ok(Json(json!({ "message": "Entry deleted successfully" })))
}

const LIKE_ESCAPE: char = '!';

fn escape_like_pattern(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(ch);
    }
    out
}

pub async fn search_entries(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM entries WHERE 1=1", SUMMARY_COLUMNS));

    if let Some(q) = params.q.as_deref().filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like_pattern(&q.to_lowercase()));
        qb.push(" AND (LOWER(content) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '!' OR LOWER(location) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '!')");
    }

    if !params.tags.is_empty() {
        // At least one of the given tags must appear in the entry's tag list.
        qb.push(" AND EXISTS (SELECT 1 FROM json_each(entries.tags) WHERE json_each.value IN (");
        let mut separated = qb.separated(", ");
        for tag in &params.tags {
            separated.push_bind(tag);
        }
        qb.push("))");
    }

    if let Some(mood) = params.mood.as_deref().filter(|m| !m.is_empty()) {
        qb.push(" AND mood = ").push_bind(mood);
    }

    if let Some(start) = &params.start_date {
        qb.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = &params.end_date {
        qb.push(" AND date <= ").push_bind(end);
    }

    qb.push(" ORDER BY created_at DESC");

    let rows = qb.build().fetch_all(&state.db).await?;
    let entries = rows.iter().map(row_to_summary).collect::<AppResult<Vec<_>>>()?;
    Ok(Json(entries))
}

pub async fn list_tags(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = sqlx::query(
        r#"SELECT DISTINCT j.value AS tag
           FROM entries, json_each(entries.tags) AS j
           ORDER BY tag ASC"#,
    )
    .fetch_all(&state.db)
    .await?;

    let tags = rows
        .iter()
        .map(|row| row.try_get::<String, _>("tag"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(tags))
}
