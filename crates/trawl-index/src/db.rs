use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::time::Duration;

use trawl_types::{EventRecord, EventRole, Match, SessionId, SessionSummary, SortOrder};

use crate::records::SessionCursor;
use crate::{Result, queries, schema};

/// Handle to the index database. The sync engine is the sole writer; read
/// paths (search, listing) tolerate a concurrent writer through the busy
/// timeout instead of failing on the first locked page.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(4))?;

        let db = Self { conn };
        schema::init_schema(&db.conn)?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        schema::init_schema(&db.conn)?;
        Ok(db)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // Meta key/value store (index state lives here).

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO meta (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = ?2
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    // Cursor store.

    pub fn get_cursor(&self, session_id: &SessionId) -> Result<Option<SessionCursor>> {
        queries::session::get_cursor(&self.conn, session_id)
    }

    pub fn touch_session(&self, session_id: &SessionId, seen_at: &str) -> Result<()> {
        queries::session::touch(&self.conn, session_id, seen_at)
    }

    pub fn invalidate_cursor(&self, session_id: &SessionId) -> Result<()> {
        queries::session::invalidate(&self.conn, session_id)
    }

    pub fn clear_all(&self) -> Result<()> {
        queries::session::clear_all(&self.conn)
    }

    // Events.

    pub fn commit_session_ingest(
        &self,
        cursor: &SessionCursor,
        events: &[EventRecord],
        reset: bool,
    ) -> Result<()> {
        queries::event::commit_ingest(&self.conn, cursor, events, reset)
    }

    pub fn max_seq(&self, session_id: &SessionId) -> Result<Option<i64>> {
        queries::event::max_seq(&self.conn, session_id)
    }

    pub fn events_range(&self, session_id: &SessionId, lo: i64, hi: i64) -> Result<Vec<EventRecord>> {
        queries::event::range(&self.conn, session_id, lo, hi)
    }

    pub fn count_events(&self) -> Result<usize> {
        queries::event::count(&self.conn)
    }

    pub fn count_sessions(&self) -> Result<usize> {
        queries::session::count(&self.conn)
    }

    pub fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        queries::session::list(&self.conn, limit)
    }

    // Search primitives.

    pub fn search_fulltext(
        &self,
        query: &str,
        roles: &[EventRole],
        sort: SortOrder,
        limit: usize,
    ) -> Result<Vec<Match>> {
        queries::search::fulltext(&self.conn, query, roles, sort, limit)
    }

    pub fn search_substring(
        &self,
        query: &str,
        roles: &[EventRole],
        limit: usize,
    ) -> Result<Vec<Match>> {
        queries::search::substring(&self.conn, query, roles, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(session_id: &SessionId, seq: i64, role: EventRole, content: &str) -> EventRecord {
        EventRecord {
            session_id: session_id.clone(),
            seq,
            ts: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, seq as u32).unwrap()),
            role,
            content: content.to_string(),
            opaque: false,
        }
    }

    fn cursor(session_id: &SessionId) -> SessionCursor {
        SessionCursor {
            session_id: session_id.clone(),
            path: format!("/logs/{}.jsonl", session_id.as_str()),
            file_size: 100,
            mtime_epoch: 1_700_000_000.0,
            last_offset: 100,
            last_fingerprint: Some("abc".to_string()),
            last_seen_at: None,
        }
    }

    #[test]
    fn test_commit_ingest_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let sid = SessionId::new("s1");

        let events = vec![
            event(&sid, 0, EventRole::User, "hello"),
            event(&sid, 1, EventRole::Assistant, "world"),
        ];

        db.commit_session_ingest(&cursor(&sid), &events, false)
            .unwrap();
        db.commit_session_ingest(&cursor(&sid), &events, false)
            .unwrap();

        assert_eq!(db.count_events().unwrap(), 2);
        assert_eq!(db.max_seq(&sid).unwrap(), Some(1));
    }

    #[test]
    fn test_reset_replaces_prior_events() {
        let db = Database::open_in_memory().unwrap();
        let sid = SessionId::new("s1");

        let first = vec![
            event(&sid, 0, EventRole::User, "old zero"),
            event(&sid, 1, EventRole::User, "old one"),
            event(&sid, 2, EventRole::User, "old two"),
        ];
        db.commit_session_ingest(&cursor(&sid), &first, false)
            .unwrap();

        let rewritten = vec![event(&sid, 0, EventRole::User, "new zero")];
        db.commit_session_ingest(&cursor(&sid), &rewritten, true)
            .unwrap();

        assert_eq!(db.count_events().unwrap(), 1);
        let events = db.events_range(&sid, 0, 10).unwrap();
        assert_eq!(events[0].content, "new zero");
    }

    #[test]
    fn test_cursor_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let sid = SessionId::new("s1");

        assert!(db.get_cursor(&sid).unwrap().is_none());

        db.commit_session_ingest(&cursor(&sid), &[], false).unwrap();

        let stored = db.get_cursor(&sid).unwrap().unwrap();
        assert_eq!(stored.last_offset, 100);
        assert_eq!(stored.last_fingerprint.as_deref(), Some("abc"));
    }

    #[test]
    fn test_invalidate_forces_mismatch() {
        let db = Database::open_in_memory().unwrap();
        let sid = SessionId::new("s1");

        db.commit_session_ingest(&cursor(&sid), &[], false).unwrap();
        db.invalidate_cursor(&sid).unwrap();

        let stored = db.get_cursor(&sid).unwrap().unwrap();
        assert_eq!(stored.last_offset, 0);
        assert!(stored.last_fingerprint.is_none());
        assert_eq!(stored.file_size, -1);
    }

    #[test]
    fn test_substring_search_filters_roles() {
        let db = Database::open_in_memory().unwrap();
        let sid = SessionId::new("s1");

        let events = vec![
            event(&sid, 0, EventRole::User, "needle in user"),
            event(&sid, 1, EventRole::Internal, "needle in internal"),
        ];
        db.commit_session_ingest(&cursor(&sid), &events, false)
            .unwrap();

        let user_only = db
            .search_substring("needle", &[EventRole::User], 10)
            .unwrap();
        assert_eq!(user_only.len(), 1);
        assert_eq!(user_only[0].role, EventRole::User);
        assert!(user_only[0].score.is_none());

        let both = db
            .search_substring("NEEDLE", &[EventRole::User, EventRole::Internal], 10)
            .unwrap();
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn test_substring_search_orders_by_recency() {
        let db = Database::open_in_memory().unwrap();
        let sid = SessionId::new("s1");

        let events = vec![
            event(&sid, 0, EventRole::User, "needle here"),
            event(&sid, 5, EventRole::User, "needle there"),
        ];
        db.commit_session_ingest(&cursor(&sid), &events, false)
            .unwrap();

        let matches = db.search_substring("needle", &[EventRole::User], 10).unwrap();
        assert_eq!(matches[0].seq, 5);
        assert_eq!(matches[1].seq, 0);
    }

    #[test]
    fn test_list_sessions_counts_roles() {
        let db = Database::open_in_memory().unwrap();
        let sid = SessionId::new("s1");

        let events = vec![
            event(&sid, 0, EventRole::User, "a"),
            event(&sid, 1, EventRole::Assistant, "b"),
            event(&sid, 2, EventRole::Internal, "c"),
            event(&sid, 3, EventRole::User, "d"),
        ];
        db.commit_session_ingest(&cursor(&sid), &events, false)
            .unwrap();

        let sessions = db.list_sessions(10).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].user_events, 2);
        assert_eq!(sessions[0].assistant_events, 1);
        assert_eq!(sessions[0].internal_events, 1);
        assert!(sessions[0].first_ts.is_some());
    }
}
