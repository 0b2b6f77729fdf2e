use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stable session identifier, derived from the source file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A session log file as seen by the scanner.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub size: u64,
    /// Modification time as Unix seconds. Compared with a small epsilon
    /// because filesystems round differently.
    pub mtime_epoch: f64,
}

/// Listing row for one indexed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub path: String,
    pub first_ts: Option<String>,
    pub last_ts: Option<String>,
    pub user_events: i64,
    pub assistant_events: i64,
    pub internal_events: i64,
}
