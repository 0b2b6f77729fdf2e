use anyhow::Result;
use serde_json::json;

use trawl_index::IndexManager;

use crate::context::ExecutionContext;

pub fn handle(ctx: &ExecutionContext, json_out: bool) -> Result<()> {
    let db = ctx.open_existing_db()?;
    let state = IndexManager::new(&db).state();

    let sessions = db.count_sessions()?;
    let events = db.count_events()?;

    if json_out {
        let payload = json!({
            "sessions": sessions,
            "events": events,
            "fts_available": state.available,
            "fts_ready": state.ready,
        });
        println!("{}", serde_json::to_string(&payload)?);
        return Ok(());
    }

    println!("sessions: {}", sessions);
    println!("events: {}", events);
    println!("fts available: {}", state.available);
    println!("fts ready: {}", state.ready);

    Ok(())
}
