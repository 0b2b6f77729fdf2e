use rusqlite::Connection;
use trawl_types::{EventRole, Match, SessionId, SortOrder, parse_ts};

use crate::Result;

fn role_placeholders(roles: &[EventRole]) -> String {
    vec!["?"; roles.len()].join(", ")
}

fn match_from_row(row: &rusqlite::Row<'_>, score: Option<f64>) -> rusqlite::Result<Match> {
    Ok(Match {
        session_id: SessionId::new(row.get::<_, String>(0)?),
        seq: row.get(1)?,
        ts: row
            .get::<_, Option<String>>(2)?
            .as_deref()
            .and_then(parse_ts),
        role: row
            .get::<_, String>(3)?
            .parse()
            .unwrap_or(EventRole::Internal),
        content: row.get(4)?,
        score,
        span: None,
    })
}

/// Ranked query through the FTS5 shadow table.
///
/// The score is the negated bm25 value so that higher means more relevant;
/// beyond that the scale is the engine's own and is passed through untouched.
/// Errors here include FTS5 MATCH syntax failures and a missing shadow table
/// (concurrent rebuild); callers are expected to fall back to the substring
/// path rather than surface them.
pub fn fulltext(
    conn: &Connection,
    query: &str,
    roles: &[EventRole],
    sort: SortOrder,
    limit: usize,
) -> Result<Vec<Match>> {
    let order = match sort {
        SortOrder::Relevance => "score DESC, e.ts DESC",
        SortOrder::Recent => "e.ts DESC, score DESC",
    };

    let sql = format!(
        r#"
        SELECT e.session_id, e.seq, e.ts, e.role, e.content, -bm25(events_fts) AS score
        FROM events_fts
        JOIN events e ON e.rowid = events_fts.rowid
        WHERE events_fts MATCH ? AND e.role IN ({})
        ORDER BY {}
        LIMIT ?
        "#,
        role_placeholders(roles),
        order
    );

    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    params.push(Box::new(query.to_string()));
    for role in roles {
        params.push(Box::new(role.as_str().to_string()));
    }
    params.push(Box::new(limit as i64));

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let matches = stmt
        .query_map(param_refs.as_slice(), |row| {
            let score: Option<f64> = row.get(5)?;
            match_from_row(row, score)
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(matches)
}

/// Case-insensitive substring scan over stored content. No relevance score
/// exists on this path, so ordering is by recency alone.
pub fn substring(
    conn: &Connection,
    query: &str,
    roles: &[EventRole],
    limit: usize,
) -> Result<Vec<Match>> {
    let sql = format!(
        r#"
        SELECT session_id, seq, ts, role, content
        FROM events
        WHERE instr(lower(content), lower(?)) > 0 AND role IN ({})
        ORDER BY ts DESC
        LIMIT ?
        "#,
        role_placeholders(roles)
    );

    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    params.push(Box::new(query.to_string()));
    for role in roles {
        params.push(Box::new(role.as_str().to_string()));
    }
    params.push(Box::new(limit as i64));

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let matches = stmt
        .query_map(param_refs.as_slice(), |row| match_from_row(row, None))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(matches)
}
