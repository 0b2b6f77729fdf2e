use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EventRecord, EventRole, SessionId};

/// Which event roles a query is allowed to match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub user: bool,
    pub assistant: bool,
    pub internal: bool,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            user: true,
            assistant: false,
            internal: false,
        }
    }
}

impl Scope {
    pub fn roles(&self) -> Vec<EventRole> {
        let mut roles = Vec::new();
        if self.user {
            roles.push(EventRole::User);
        }
        if self.assistant {
            roles.push(EventRole::Assistant);
        }
        if self.internal {
            roles.push(EventRole::Internal);
        }
        roles
    }

    pub fn is_empty(&self) -> bool {
        !self.user && !self.assistant && !self.internal
    }
}

/// Order for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Score descending, ties broken by timestamp descending. In fallback
    /// mode no score exists, so this degrades to recency.
    Relevance,
    /// Timestamp descending regardless of score.
    Recent,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Relevance
    }
}

/// A search query plus its scope and ordering.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub scope: Scope,
    pub sort: SortOrder,
    pub limit: usize,
}

/// Which execution path answered a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    FullText,
    Substring,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::FullText => "fts",
            SearchMode::Substring => "substring",
        }
    }
}

/// Whether the full-text index currently exists and reflects stored events.
///
/// Persisted alongside the data (not process state) so a query in another
/// process sees the same availability the last sync recorded.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IndexState {
    /// The full-text engine is compiled in and the shadow table exists.
    pub available: bool,
    /// The index was rebuilt after the last ingestion of new events.
    pub ready: bool,
}

impl IndexState {
    pub fn usable(&self) -> bool {
        self.available && self.ready
    }
}

/// Transient result of a query before assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub session_id: SessionId,
    pub seq: i64,
    pub ts: Option<DateTime<Utc>>,
    pub role: EventRole,
    pub content: String,
    /// Relevance score from the full-text engine; `None` in substring mode.
    /// Engine-specific scale, only meaningful for ordering.
    pub score: Option<f64>,
    /// First matched byte range within `content`, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<(usize, usize)>,
}

/// A match enriched for presentation: snippet, optional surrounding events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub session_id: SessionId,
    pub seq: i64,
    pub ts: Option<DateTime<Utc>>,
    pub role: EventRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub snippet: String,
    /// Neighboring events (including the matched one) in ascending sequence
    /// order, when context was requested.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub context: Vec<EventRecord>,
    pub sort: SortOrder,
}
