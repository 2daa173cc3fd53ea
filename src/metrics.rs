use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Operational counters for monitoring.
///
/// These are process-local and reset on restart; the domain statistics under
/// `/stats` are computed from the database instead.
#[derive(Clone)]
pub struct Metrics {
    pub entries_created: Arc<AtomicU64>,
    pub entries_updated: Arc<AtomicU64>,
    pub entries_deleted: Arc<AtomicU64>,
    pub attachments_stored: Arc<AtomicU64>,
    pub attachments_deleted: Arc<AtomicU64>,
    pub visits_recorded: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            entries_created: Arc::new(AtomicU64::new(0)),
            entries_updated: Arc::new(AtomicU64::new(0)),
            entries_deleted: Arc::new(AtomicU64::new(0)),
            attachments_stored: Arc::new(AtomicU64::new(0)),
            attachments_deleted: Arc::new(AtomicU64::new(0)),
            visits_recorded: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_entries_created(&self) {
        self.entries_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_entries_updated(&self) {
        self.entries_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_entries_deleted(&self) {
        self.entries_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_attachments_stored(&self) {
        self.attachments_stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_attachments_deleted(&self) {
        self.attachments_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_visits_recorded(&self) {
        self.visits_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entries_created: self.entries_created.load(Ordering::Relaxed),
            entries_updated: self.entries_updated.load(Ordering::Relaxed),
            entries_deleted: self.entries_deleted.load(Ordering::Relaxed),
            attachments_stored: self.attachments_stored.load(Ordering::Relaxed),
            attachments_deleted: self.attachments_deleted.load(Ordering::Relaxed),
            visits_recorded: self.visits_recorded.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub entries_created: u64,
    pub entries_updated: u64,
    pub entries_deleted: u64,
    pub attachments_stored: u64,
    pub attachments_deleted: u64,
    pub visits_recorded: u64,
    pub uptime_seconds: u64,
}
