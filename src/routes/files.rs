use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    db::now_utc,
    error::{validation::require_content_type_prefix, AppError, AppResult},
    state::AppState,
};

/// One parsed multipart upload: the file part plus the optional `duration`
/// text part sent alongside voice notes.
struct UploadPart {
    filename: String,
    content_type: String,
    data: Bytes,
    duration: Option<String>,
}

/// Reads the multipart body, returning the part named `field`. The file must
/// carry a non-empty filename, a content type with the required prefix, and
/// at most `max_bytes` of payload. Unknown parts are drained and ignored.
async fn read_upload(
    mut multipart: Multipart,
    field: &str,
    content_type_prefix: &str,
    max_bytes: usize,
) -> AppResult<UploadPart> {
    let mut file_part: Option<(String, String, Bytes)> = None;
    let mut duration: Option<String> = None;

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = part.name().map(str::to_owned);
        match name.as_deref() {
            Some(name) if name == field => {
                let filename = part
                    .file_name()
                    .map(str::to_owned)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| AppError::ValidationError {
                        field: field.to_string(),
                        message: "file part with a filename is required".to_string(),
                    })?;
                let content_type = part.content_type().map(str::to_owned).unwrap_or_default();
                require_content_type_prefix(&content_type, content_type_prefix, field)?;

                let data = part
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
                if data.len() > max_bytes {
                    return Err(AppError::PayloadTooLarge(format!(
                        "Attachment exceeds the {} byte limit",
                        max_bytes
                    )));
                }
                file_part = Some((filename, content_type, data));
            }
            // Caller-supplied, stored unvalidated.
            Some("duration") => {
                duration = part.text().await.ok().filter(|d| !d.is_empty());
            }
            _ => {}
        }
    }

    let (filename, content_type, data) = file_part.ok_or_else(|| AppError::ValidationError {
        field: field.to_string(),
        message: "file part missing".to_string(),
    })?;

    Ok(UploadPart { filename, content_type, data, duration })
}

/// Collision-resistant stored filename, original name preserved as suffix.
fn stored_filename(id: &Uuid, original: &str) -> String {
    format!("{}_{}", id.simple(), original)
}

async fn insert_attachment(
    state: &AppState,
    id: &Uuid,
    entry_id: Option<&str>,
    kind: &str,
    filename: &str,
    upload: &UploadPart,
) -> AppResult<()> {
    sqlx::query(
        r#"INSERT INTO attachments (id, entry_id, kind, filename, content_type, data, duration, uploaded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
    )
    .bind(id.to_string())
    .bind(entry_id)
    .bind(kind)
    .bind(filename)
    .bind(&upload.content_type)
    .bind(upload.data.as_ref())
    .bind(&upload.duration)
    .bind(now_utc())
    .execute(&state.db)
    .await?;

    state.metrics.inc_attachments_stored();
    Ok(())
}

/// Marks the denormalized flag on the owning entry after an upload. The
/// entry's existence is not verified beforehand; for an unknown id this
/// update simply affects no rows and the attachment stays orphaned.
async fn set_entry_flag(state: &AppState, entry_id: &str, column: &str) -> AppResult<()> {
    // column is one of the two hardcoded flag names, never client input
    sqlx::query(&format!("UPDATE entries SET {} = 1, updated_at = ?1 WHERE id = ?2", column))
        .bind(now_utc())
        .bind(entry_id)
        .execute(&state.db)
        .await?;
    Ok(())
}

/// Recomputes a flag from the count of remaining attachments of that kind.
/// Best-effort denormalization: a concurrent upload or delete between the
/// count and the update can leave the flag stale until the next mutation.
async fn recompute_entry_flag(state: &AppState, entry_id: &str, kind: &str) -> AppResult<()> {
    let column = match kind {
        "image" => "has_images",
        "voice" => "has_voice",
        _ => return Ok(()),
    };

    let row = sqlx::query("SELECT COUNT(*) AS cnt FROM attachments WHERE entry_id = ?1 AND kind = ?2")
        .bind(entry_id)
        .bind(kind)
        .fetch_one(&state.db)
        .await?;
    let remaining: i64 = row.try_get("cnt")?;

    sqlx::query(&format!("UPDATE entries SET {} = ?1, updated_at = ?2 WHERE id = ?3", column))
        .bind(if remaining > 0 { 1i64 } else { 0i64 })
        .bind(now_utc())
        .bind(entry_id)
        .execute(&state.db)
        .await?;
    Ok(())
}

pub async fn upload_image(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let upload = read_upload(multipart, "image", "image/", state.config.attachments.max_bytes).await?;

    let id = Uuid::new_v4();
    let filename = stored_filename(&id, &upload.filename);
    insert_attachment(&state, &id, Some(&entry_id), "image", &filename, &upload).await?;
    set_entry_flag(&state, &entry_id, "has_images").await?;

    Ok(Json(json!({ "image_id": id.to_string(), "filename": filename })))
}

pub async fn upload_voice(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let upload = read_upload(multipart, "voice", "audio/", state.config.attachments.max_bytes).await?;

    let id = Uuid::new_v4();
    let filename = stored_filename(&id, &upload.filename);
    insert_attachment(&state, &id, Some(&entry_id), "voice", &filename, &upload).await?;
    set_entry_flag(&state, &entry_id, "has_voice").await?;

    Ok(Json(json!({ "voice_id": id.to_string(), "filename": filename })))
}

/// Stores a new global background image. Backgrounds are a singleton: every
/// previously stored background attachment is removed first, then the
/// settings document is pointed at the new attachment id.
pub async fn upload_background(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let upload =
        read_upload(multipart, "background", "image/", state.config.attachments.max_bytes).await?;

    sqlx::query("DELETE FROM attachments WHERE kind = 'background'").execute(&state.db).await?;

    let id = Uuid::new_v4();
    let filename = stored_filename(&id, &upload.filename);
    insert_attachment(&state, &id, None, "background", &filename, &upload).await?;

    let now = now_utc();
    sqlx::query(
        r#"INSERT INTO settings (id, theme, background_type, background_value, font_family, font_size, updated_at)
           VALUES (1, 'light', 'image', ?1, 'sans-serif', 'medium', ?2)
           ON CONFLICT(id) DO UPDATE SET background_type = 'image', background_value = ?1, updated_at = ?2"#,
    )
    .bind(id.to_string())
    .bind(&now)
    .execute(&state.db)
    .await?;

    Ok(Json(json!({ "background_id": id.to_string() })))
}

fn parse_attachment_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest("Invalid attachment id".to_string()))
}

pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_attachment_id(&id)?;

    let row = sqlx::query("SELECT filename, content_type, data FROM attachments WHERE id = ?1")
        .bind(id.to_string())
        .fetch_optional(&state.db)
        .await?;
    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound("Attachment not found".to_string())),
    };

    let filename: String = row.try_get("filename")?;
    let content_type: String = row.try_get("content_type")?;
    let data: Vec<u8> = row.try_get("data")?;

    let mut response = data.into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));
    if let Ok(header_val) = HeaderValue::from_str(&disposition) {
        response.headers_mut().insert(header::CONTENT_DISPOSITION, header_val);
    }
    Ok(response)
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_attachment_id(&id)?;

    let row = sqlx::query("SELECT entry_id, kind FROM attachments WHERE id = ?1")
        .bind(id.to_string())
        .fetch_optional(&state.db)
        .await?;
    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound("Attachment not found".to_string())),
    };
    let entry_id: Option<String> = row.try_get("entry_id")?;
    let kind: String = row.try_get("kind")?;

    sqlx::query("DELETE FROM attachments WHERE id = ?1")
        .bind(id.to_string())
        .execute(&state.db)
        .await?;
    state.metrics.inc_attachments_deleted();

    // Two independent writes, no cross-document transaction: the flag may be
    // stale if this step fails, until the next attachment mutation.
    if let Some(entry_id) = entry_id {
        recompute_entry_flag(&state, &entry_id, &kind).await?;
    }

    Ok(Json(json!({ "message": "Attachment deleted successfully" })))
}
