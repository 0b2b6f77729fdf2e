use trawl_types::SessionId;

/// Ingestion cursor row for one session file.
///
/// `last_offset` and `last_fingerprint` mark how much of the file has been
/// durably ingested; `file_size` and `mtime_epoch` support the O(1)
/// unchanged check on repeated syncs.
#[derive(Debug, Clone)]
pub struct SessionCursor {
    /// Session identifier (hash of the source path).
    pub session_id: SessionId,
    /// Absolute path to the log file.
    pub path: String,
    /// File size at the last successful ingestion.
    pub file_size: i64,
    /// Modification time at the last successful ingestion (Unix seconds).
    pub mtime_epoch: f64,
    /// Byte offset up to which lines have been ingested.
    pub last_offset: i64,
    /// Hex SHA-256 over the raw bytes up to `last_offset`. `None` after an
    /// invalidation, forcing the next sync to treat the session as new.
    pub last_fingerprint: Option<String>,
    /// Last time the scanner saw this file (RFC 3339).
    pub last_seen_at: Option<String>,
}
