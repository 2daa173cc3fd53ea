use serde::{Deserialize, Serialize};

/// Projection returned by the list and search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: String,
    pub date: String,
    pub content: String,
    pub mood: String,
    pub weather: String,
    pub tags: Vec<String>,
    pub location: String,
    pub has_images: bool,
    pub has_voice: bool,
    pub background: Option<String>,
    pub color_scheme: Option<String>,
}

/// Full entry as returned by `GET /entries/{id}`, including descriptors for
/// any attachments currently owned by the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDetail {
    pub id: String,
    pub date: String,
    pub content: String,
    pub mood: String,
    pub weather: String,
    pub tags: Vec<String>,
    pub location: String,
    pub has_images: bool,
    pub has_voice: bool,
    pub background: Option<String>,
    pub color_scheme: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub images: Vec<ImageDescriptor>,
    pub voice_notes: Vec<VoiceNoteDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub id: String,
    pub filename: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceNoteDescriptor {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    /// Caller-supplied at upload time, stored unvalidated.
    pub duration: Option<String>,
    pub uploaded_at: String,
}

/// The settings singleton, stripped of its internal row id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsDto {
    pub theme: String,
    pub background_type: String,
    pub background_value: String,
    pub font_family: String,
    pub font_size: String,
    pub accent_color: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorCount {
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodCount {
    pub mood: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthCount {
    /// First seven characters of the entry date ("YYYY-MM" for ISO dates).
    pub month: String,
    pub count: i64,
}

/// Aggregate statistics, computed fresh on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_entries: i64,
    pub entries_with_images: i64,
    pub entries_with_voice: i64,
    /// Sum over all entries of content split on single spaces. This is
    /// whitespace-run-sensitive: consecutive spaces produce empty fragments
    /// and empty content still counts as one word.
    pub total_words: i64,
    pub top_tags: Vec<TagCount>,
    pub mood_distribution: Vec<MoodCount>,
    pub entries_by_month: Vec<MonthCount>,
}
