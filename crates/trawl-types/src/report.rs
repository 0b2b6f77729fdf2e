use serde::{Deserialize, Serialize};

/// Ingestion mode for a sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Only new or changed session files are ingested.
    Incremental,
    /// All cursors are invalidated and everything is re-ingested.
    Full,
}

/// A non-fatal per-source failure captured during a sync pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncError {
    pub path: Option<String>,
    pub message: String,
}

/// Outcome of one sync pass. Per-item failures are aggregated here; the pass
/// itself only fails on storage-level errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub sessions_scanned: usize,
    pub sessions_changed: usize,
    pub lines_read: usize,
    pub lines_skipped: usize,
    pub events_ingested: usize,
    pub fts_available: bool,
    pub fts_reindexed: bool,
    /// Soft failure from the index rebuild, when one occurred.
    pub index_warning: Option<String>,
    pub errors: Vec<SyncError>,
}
