use anyhow::Result;

use crate::context::ExecutionContext;

pub fn handle(ctx: &ExecutionContext, limit: usize, json: bool) -> Result<()> {
    let db = ctx.open_existing_db()?;
    let sessions = db.list_sessions(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    for session in &sessions {
        let id = &session.id.as_str()[..8.min(session.id.as_str().len())];
        println!(
            "{}  {}  user={} assistant={} internal={}  {}",
            session.last_ts.as_deref().unwrap_or("-"),
            id,
            session.user_events,
            session.assistant_events,
            session.internal_events,
            session.path,
        );
    }

    Ok(())
}
