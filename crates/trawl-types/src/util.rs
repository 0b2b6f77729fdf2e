use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::SessionId;

/// Derive the stable session identifier from a log file path.
///
/// The path is hashed rather than stored raw so the identifier stays a fixed
/// width regardless of how deeply the sessions tree nests.
pub fn session_id_from_path(path: &Path) -> SessionId {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    SessionId::new(format!("{:x}", hasher.finalize()))
}

/// Parse a timestamp string from a log record.
///
/// Session logs use RFC 3339 strings like "2025-11-05T02:19:10.108Z".
/// Anything unparseable becomes `None` rather than an error.
pub fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Truncate a string to a maximum number of characters.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect::<String>() + "...(truncated)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_session_id_is_stable_and_hex() {
        let path = PathBuf::from("/tmp/sessions/2025/11/04/run-1.jsonl");
        let a = session_id_from_path(&path);
        let b = session_id_from_path(&path);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_session_id_differs_per_path() {
        let a = session_id_from_path(Path::new("/a.jsonl"));
        let b = session_id_from_path(Path::new("/b.jsonl"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_ts_accepts_zulu() {
        let ts = parse_ts("2025-11-05T02:19:10.108Z").unwrap();
        assert_eq!(ts.timestamp(), 1762309150);
    }

    #[test]
    fn test_parse_ts_rejects_garbage() {
        assert!(parse_ts("not a timestamp").is_none());
        assert!(parse_ts("").is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0123456789abc", 10), "0123456789...(truncated)");
    }
}
