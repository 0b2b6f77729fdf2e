use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SessionId;

/// Role classification for indexed events.
///
/// The source logs carry an open set of record shapes; anything that is not
/// attributable to a user or assistant message is classified as `Internal`
/// so it stays searchable instead of being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventRole {
    User,
    Assistant,
    Internal,
}

impl EventRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventRole::User => "user",
            EventRole::Assistant => "assistant",
            EventRole::Internal => "internal",
        }
    }

    /// Classify a message role string from a log record.
    pub fn from_message_role(role: &str) -> Self {
        match role {
            "user" => EventRole::User,
            "assistant" => EventRole::Assistant,
            _ => EventRole::Internal,
        }
    }
}

impl std::str::FromStr for EventRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(EventRole::User),
            "assistant" => Ok(EventRole::Assistant),
            "internal" => Ok(EventRole::Internal),
            other => Err(format!("unknown event role: {}", other)),
        }
    }
}

/// One parsed record from a session file, as stored in the index.
///
/// Immutable once stored; re-ingestion upserts on `(session_id, seq)` so the
/// same line never produces a duplicate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub session_id: SessionId,

    /// Position within the session: gap-free, strictly increasing in file
    /// order, assigned at parse time.
    pub seq: i64,

    pub ts: Option<DateTime<Utc>>,

    pub role: EventRole,

    pub content: String,

    /// True when the line did not match a recognized record shape and was
    /// captured as opaque JSON instead.
    pub opaque: bool,
}

/// Parser output before a session and sequence number are attached.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub ts: Option<DateTime<Utc>>,
    pub role: EventRole,
    pub content: String,
    pub opaque: bool,
}

/// Why a line was not turned into an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Blank line between records.
    EmptyLine,
    /// Not valid JSON.
    Malformed,
    /// Valid JSON but not an object.
    NotAnObject,
    /// Recognized shape with no extractable text.
    NoContent,
    /// Record duplicates content already carried by another shape.
    Duplicate,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EmptyLine => "empty line",
            SkipReason::Malformed => "malformed JSON",
            SkipReason::NotAnObject => "not a JSON object",
            SkipReason::NoContent => "no extractable text",
            SkipReason::Duplicate => "duplicate of another record",
        }
    }
}

/// Per-line parse result. Decode failures never escape this boundary; a bad
/// line becomes `Skipped` and ingestion continues with the next one.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Accepted(EventDraft),
    Skipped(SkipReason),
}
