use chrono::Utc;
use sqlx::SqlitePool;

/// Current UTC timestamp as sortable RFC3339 text with microsecond
/// precision, so `ORDER BY created_at DESC` is stable for entries created
/// within the same second.
pub fn now_utc() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance (best-effort, log failures)
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA busy_timeout=10000;").execute(pool).await {
        tracing::warn!("Failed to set busy_timeout: {}", e);
    }

    // entries table. Tags are stored as a JSON array of strings and queried
    // via json_each; duplicates are allowed and order is preserved.
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            content TEXT NOT NULL,
            mood TEXT NOT NULL DEFAULT '',
            weather TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '[]',
            has_images INTEGER NOT NULL DEFAULT 0,
            has_voice INTEGER NOT NULL DEFAULT 0,
            background TEXT NULL,
            color_scheme TEXT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // attachments table. entry_id is intentionally NOT a foreign key: uploads
    // do not verify the owning entry and background attachments are global
    // (entry_id NULL). The cascade on entry deletion happens in code.
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS attachments (
            id TEXT PRIMARY KEY,
            entry_id TEXT NULL,
            kind TEXT NOT NULL,
            filename TEXT NOT NULL,
            content_type TEXT NOT NULL,
            data BLOB NOT NULL,
            duration TEXT NULL,
            uploaded_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // settings singleton (exactly one row, created lazily on first read)
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            theme TEXT NOT NULL,
            background_type TEXT NOT NULL,
            background_value TEXT NOT NULL,
            font_family TEXT NOT NULL,
            font_size TEXT NOT NULL,
            accent_color TEXT NULL,
            updated_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // visitors singleton (created on first increment, not on read)
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS visitors (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            count INTEGER NOT NULL DEFAULT 0
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_entries_created", "CREATE INDEX IF NOT EXISTS idx_entries_created ON entries(created_at DESC)"),
        ("idx_entries_date", "CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date)"),
        ("idx_attachments_entry_kind", "CREATE INDEX IF NOT EXISTS idx_attachments_entry_kind ON attachments(entry_id, kind)"),
        ("idx_attachments_kind", "CREATE INDEX IF NOT EXISTS idx_attachments_kind ON attachments(kind)"),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            tracing::warn!("Failed to create index {}: {}", name, e);
        }
    }

    Ok(())
}
