use rusqlite::Connection;

use crate::Result;

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 3;

// NOTE: Schema Design Rationale
//
// Why store event text in the database (not pointers back into the logs)?
// - Search has to scan content even in fallback mode; re-opening log files
//   per query would make the substring path O(corpus) in file handles
// - Snippets and context expansion need random access by (session, seq)
// - The logs stay the source of truth: a full refresh rebuilds everything
//
// Why (session_id, seq) as the event key?
// - Line order inside a file is the only ordering the logs guarantee
// - Upserting on the pair makes re-ingestion of the same line a no-op
// - Context expansion is a simple BETWEEN over seq
//
// Why a cursor on the sessions row (offset + prefix fingerprint)?
// - size/mtime alone give the O(1) unchanged check but cannot distinguish
//   append from truncate-and-rewrite; the fingerprint can

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version != SCHEMA_VERSION {
        drop_all_tables(conn)?;
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            path TEXT NOT NULL UNIQUE,
            file_size INTEGER NOT NULL,
            mtime_epoch REAL NOT NULL,
            last_offset INTEGER NOT NULL DEFAULT 0,
            last_fingerprint TEXT,
            last_seen_at TEXT
        );

        CREATE TABLE IF NOT EXISTS events (
            session_id TEXT NOT NULL,
            seq INTEGER NOT NULL,
            ts TEXT,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            opaque INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (session_id, seq),
            FOREIGN KEY (session_id) REFERENCES sessions(id)
        );

        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_events_ts ON events(ts DESC);
        CREATE INDEX IF NOT EXISTS idx_events_role ON events(role);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS events_fts;
        DROP TABLE IF EXISTS events;
        DROP TABLE IF EXISTS sessions;
        DROP TABLE IF EXISTS meta;
        "#,
    )?;
    Ok(())
}
