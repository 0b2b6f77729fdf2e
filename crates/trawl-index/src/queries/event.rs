use rusqlite::{Connection, params};
use trawl_types::{EventRecord, EventRole, SessionId, parse_ts};

use crate::{Result, records::SessionCursor};

use super::session;

fn role_from_row(raw: &str) -> EventRole {
    raw.parse().unwrap_or(EventRole::Internal)
}

pub(crate) fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRecord> {
    Ok(EventRecord {
        session_id: SessionId::new(row.get::<_, String>(0)?),
        seq: row.get(1)?,
        ts: row
            .get::<_, Option<String>>(2)?
            .as_deref()
            .and_then(parse_ts),
        role: role_from_row(&row.get::<_, String>(3)?),
        content: row.get(4)?,
        opaque: row.get(5)?,
    })
}

/// Durably store one session's newly parsed events and advance its cursor,
/// atomically. Data first, cursor second: the cursor row is only written in
/// the same transaction, so an interrupted pass never records progress for
/// events that were not stored.
pub fn commit_ingest(
    conn: &Connection,
    cursor: &SessionCursor,
    events: &[EventRecord],
    reset: bool,
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    if reset {
        tx.execute(
            "DELETE FROM events WHERE session_id = ?1",
            [cursor.session_id.as_str()],
        )?;
    }

    {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO events (session_id, seq, ts, role, content, opaque)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(session_id, seq) DO UPDATE SET
                ts = ?3,
                role = ?4,
                content = ?5,
                opaque = ?6
            "#,
        )?;

        for event in events {
            stmt.execute(params![
                event.session_id.as_str(),
                event.seq,
                event.ts.map(|ts| ts.to_rfc3339()),
                event.role.as_str(),
                &event.content,
                event.opaque,
            ])?;
        }
    }

    session::upsert_cursor(&tx, cursor)?;

    tx.commit()?;
    Ok(())
}

/// Highest sequence number stored for a session, if any.
pub fn max_seq(conn: &Connection, session_id: &SessionId) -> Result<Option<i64>> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(seq) FROM events WHERE session_id = ?1",
        [session_id.as_str()],
        |row| row.get(0),
    )?;

    Ok(max)
}

/// Events of one session within an inclusive sequence range, ascending.
pub fn range(
    conn: &Connection,
    session_id: &SessionId,
    lo: i64,
    hi: i64,
) -> Result<Vec<EventRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT session_id, seq, ts, role, content, opaque
        FROM events
        WHERE session_id = ?1 AND seq BETWEEN ?2 AND ?3
        ORDER BY seq ASC
        "#,
    )?;

    let events = stmt
        .query_map(params![session_id.as_str(), lo, hi], event_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(events)
}

pub fn count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
    Ok(count as usize)
}
