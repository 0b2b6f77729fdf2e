//! Integration tests for the FTS5 index lifecycle and schema migration.

use rusqlite::Connection;
use tempfile::TempDir;

use trawl_index::{Database, IndexManager, SessionCursor};
use trawl_types::{EventRecord, EventRole, SessionId, SortOrder, parse_ts};

fn seed_events(db: &Database, texts: &[&str]) {
    let sid = SessionId::new("s1");
    let events: Vec<EventRecord> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| EventRecord {
            session_id: sid.clone(),
            seq: i as i64,
            ts: parse_ts(&format!("2026-03-01T10:{:02}:00Z", i)),
            role: EventRole::User,
            content: text.to_string(),
            opaque: false,
        })
        .collect();

    let cursor = SessionCursor {
        session_id: sid,
        path: "/logs/s1.jsonl".to_string(),
        file_size: 10,
        mtime_epoch: 1.0,
        last_offset: 10,
        last_fingerprint: Some("fp".to_string()),
        last_seen_at: None,
    };
    db.commit_session_ingest(&cursor, &events, false).unwrap();
}

#[test]
fn rebuild_makes_fulltext_queries_answerable() {
    let db = Database::open_in_memory().unwrap();
    seed_events(&db, &["galaxy brain move", "mundane chores"]);

    let manager = IndexManager::new(&db);
    if manager.rebuild().is_err() {
        // SQLite build without FTS5; the substring path is tested elsewhere.
        return;
    }
    assert!(manager.state().usable());

    let matches = db
        .search_fulltext("galaxy", &[EventRole::User], SortOrder::Relevance, 10)
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].score.is_some());
    assert_eq!(matches[0].content, "galaxy brain move");
}

#[test]
fn rebuild_picks_up_events_added_since_the_last_one() {
    let db = Database::open_in_memory().unwrap();
    seed_events(&db, &["first wave"]);

    let manager = IndexManager::new(&db);
    if manager.rebuild().is_err() {
        return;
    }

    seed_events(&db, &["first wave", "second wave arrives"]);
    manager.mark_stale().unwrap();
    assert!(!manager.state().usable());

    manager.rebuild().unwrap();
    assert!(manager.state().usable());

    let matches = db
        .search_fulltext("arrives", &[EventRole::User], SortOrder::Relevance, 10)
        .unwrap();
    assert_eq!(matches.len(), 1);
}

#[test]
fn fulltext_ties_order_by_recency() {
    let db = Database::open_in_memory().unwrap();
    seed_events(&db, &["identical probe text", "identical probe text"]);

    let manager = IndexManager::new(&db);
    if manager.rebuild().is_err() {
        return;
    }

    let matches = db
        .search_fulltext("probe", &[EventRole::User], SortOrder::Relevance, 10)
        .unwrap();
    assert_eq!(matches.len(), 2);
    // Same content, same score: the later event must come first.
    assert_eq!(matches[0].seq, 1);
    assert_eq!(matches[1].seq, 0);
}

#[test]
fn version_mismatch_drops_and_recreates() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.db");

    {
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE sessions (id TEXT PRIMARY KEY, stale_column TEXT);
            CREATE TABLE events (anything TEXT);
            CREATE TABLE meta (key TEXT PRIMARY KEY, value TEXT);
            PRAGMA user_version = 1;
            "#,
        )
        .unwrap();
        conn.execute("INSERT INTO events (anything) VALUES ('old')", [])
            .unwrap();
    }

    let db = Database::open(&db_path).unwrap();
    assert_eq!(db.count_events().unwrap(), 0);
    assert_eq!(db.count_sessions().unwrap(), 0);

    // The new schema actually works.
    seed_events(&db, &["fresh start"]);
    assert_eq!(db.count_events().unwrap(), 1);
}

#[test]
fn current_version_preserves_data_across_reopens() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.db");

    {
        let db = Database::open(&db_path).unwrap();
        seed_events(&db, &["persisted"]);
    }

    let db = Database::open(&db_path).unwrap();
    assert_eq!(db.count_events().unwrap(), 1);
    assert_eq!(db.count_sessions().unwrap(), 1);
}
