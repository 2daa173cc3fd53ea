use std::collections::{BTreeMap, HashMap};

use axum::{extract::State, response::IntoResponse, Json};
use sqlx::Row;

use crate::{
    error::AppResult,
    state::AppState,
    types::{MonthCount, MoodCount, StatsResponse, TagCount},
};

/// Aggregate statistics over all entries, computed fresh on every call.
pub async fn get_stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let totals = sqlx::query(
        r#"SELECT COUNT(*) AS total,
                  COALESCE(SUM(has_images), 0) AS with_images,
                  COALESCE(SUM(has_voice), 0) AS with_voice
           FROM entries"#,
    )
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query("SELECT content, mood, tags, date FROM entries")
        .fetch_all(&state.db)
        .await?;

    let mut total_words: i64 = 0;
    let mut tag_counts: HashMap<String, i64> = HashMap::new();
    let mut mood_counts: HashMap<String, i64> = HashMap::new();
    let mut month_counts: BTreeMap<String, i64> = BTreeMap::new();

    for row in &rows {
        let content: String = row.try_get("content")?;
        // Single-space split, deliberately whitespace-run-sensitive: runs of
        // spaces produce empty fragments and empty content counts as one.
        total_words += content.split(' ').count() as i64;

        let tags_json: String = row.try_get("tags")?;
        let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
        for tag in tags {
            *tag_counts.entry(tag).or_insert(0) += 1;
        }

        let mood: String = row.try_get("mood")?;
        if !mood.is_empty() {
            *mood_counts.entry(mood).or_insert(0) += 1;
        }

        let date: String = row.try_get("date")?;
        let month: String = date.chars().take(7).collect();
        *month_counts.entry(month).or_insert(0) += 1;
    }

    // Descending by count; equal counts fall in whatever order the map
    // iteration produced (ties are not deterministic).
    let mut top_tags: Vec<TagCount> =
        tag_counts.into_iter().map(|(tag, count)| TagCount { tag, count }).collect();
    top_tags.sort_by(|a, b| b.count.cmp(&a.count));
    top_tags.truncate(5);

    let mut mood_distribution: Vec<MoodCount> =
        mood_counts.into_iter().map(|(mood, count)| MoodCount { mood, count }).collect();
    mood_distribution.sort_by(|a, b| b.count.cmp(&a.count));

    // BTreeMap iteration yields month keys in ascending order.
    let entries_by_month: Vec<MonthCount> =
        month_counts.into_iter().map(|(month, count)| MonthCount { month, count }).collect();

    Ok(Json(StatsResponse {
        total_entries: totals.try_get("total")?,
        entries_with_images: totals.try_get("with_images")?,
        entries_with_voice: totals.try_get("with_voice")?,
        total_words,
        top_tags,
        mood_distribution,
        entries_by_month,
    }))
}
