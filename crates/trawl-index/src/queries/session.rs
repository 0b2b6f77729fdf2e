use rusqlite::{Connection, OptionalExtension, params};
use trawl_types::{SessionId, SessionSummary};

use crate::{Result, records::SessionCursor};

pub fn get_cursor(conn: &Connection, session_id: &SessionId) -> Result<Option<SessionCursor>> {
    let cursor = conn
        .query_row(
            r#"
            SELECT id, path, file_size, mtime_epoch, last_offset, last_fingerprint, last_seen_at
            FROM sessions
            WHERE id = ?1
            "#,
            [session_id.as_str()],
            |row| {
                Ok(SessionCursor {
                    session_id: SessionId::new(row.get::<_, String>(0)?),
                    path: row.get(1)?,
                    file_size: row.get(2)?,
                    mtime_epoch: row.get(3)?,
                    last_offset: row.get(4)?,
                    last_fingerprint: row.get(5)?,
                    last_seen_at: row.get(6)?,
                })
            },
        )
        .optional()?;

    Ok(cursor)
}

pub fn upsert_cursor(conn: &Connection, cursor: &SessionCursor) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO sessions (id, path, file_size, mtime_epoch, last_offset, last_fingerprint, last_seen_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(id) DO UPDATE SET
            path = ?2,
            file_size = ?3,
            mtime_epoch = ?4,
            last_offset = ?5,
            last_fingerprint = ?6,
            last_seen_at = ?7
        "#,
        params![
            cursor.session_id.as_str(),
            &cursor.path,
            cursor.file_size,
            cursor.mtime_epoch,
            cursor.last_offset,
            &cursor.last_fingerprint,
            &cursor.last_seen_at,
        ],
    )?;

    Ok(())
}

/// Record that the scanner saw an unchanged file without touching its cursor.
pub fn touch(conn: &Connection, session_id: &SessionId, seen_at: &str) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET last_seen_at = ?2 WHERE id = ?1",
        params![session_id.as_str(), seen_at],
    )?;

    Ok(())
}

/// Force the next sync to treat the session as new.
pub fn invalidate(conn: &Connection, session_id: &SessionId) -> Result<()> {
    conn.execute(
        r#"
        UPDATE sessions
        SET last_offset = 0, last_fingerprint = NULL, file_size = -1
        WHERE id = ?1
        "#,
        [session_id.as_str()],
    )?;

    Ok(())
}

/// Full-rebuild entry point: drop all ingested data and cursors.
pub fn clear_all(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM events;
        DELETE FROM sessions;
        "#,
    )?;

    Ok(())
}

pub fn list(conn: &Connection, limit: usize) -> Result<Vec<SessionSummary>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT
            s.id,
            s.path,
            MIN(e.ts),
            MAX(e.ts),
            COUNT(CASE WHEN e.role = 'user' THEN 1 END),
            COUNT(CASE WHEN e.role = 'assistant' THEN 1 END),
            COUNT(CASE WHEN e.role = 'internal' THEN 1 END)
        FROM sessions s
        LEFT JOIN events e ON e.session_id = s.id
        GROUP BY s.id, s.path
        ORDER BY MAX(e.ts) DESC
        LIMIT ?1
        "#,
    )?;

    let sessions = stmt
        .query_map([limit as i64], |row| {
            Ok(SessionSummary {
                id: SessionId::new(row.get::<_, String>(0)?),
                path: row.get(1)?,
                first_ts: row.get(2)?,
                last_ts: row.get(3)?,
                user_events: row.get(4)?,
                assistant_events: row.get(5)?,
                internal_events: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(sessions)
}

pub fn count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
    Ok(count as usize)
}
