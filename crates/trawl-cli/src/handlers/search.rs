use anyhow::Result;
use serde_json::json;

use trawl_engine::{AssembleOptions, QueryEngine, ResultAssembler, SyncEngine};
use trawl_types::{Scope, SearchHit, SearchMode, SearchRequest, SortOrder, SyncMode};

use crate::context::ExecutionContext;

pub struct SearchArgs {
    pub query: String,
    pub limit: usize,
    pub include_assistant: bool,
    pub include_internal: bool,
    pub sort: SortOrder,
    pub snippet_len: usize,
    pub context_lines: usize,
    pub full_content: bool,
    pub refresh: bool,
    pub sessions_dir: Option<String>,
    pub reindex: bool,
    pub json: bool,
}

pub fn handle(ctx: &ExecutionContext, args: SearchArgs) -> Result<()> {
    if args.refresh {
        let sessions_root = ctx.sessions_root(args.sessions_dir.as_deref())?;
        let db = ctx.open_db()?;
        SyncEngine::new(&db, &sessions_root).sync(SyncMode::Incremental, args.reindex, |_| {})?;
    }

    let db = ctx.open_existing_db()?;

    let request = SearchRequest {
        query: args.query.clone(),
        scope: Scope {
            user: true,
            assistant: args.include_assistant,
            internal: args.include_internal,
        },
        sort: args.sort,
        limit: args.limit,
    };

    let response = QueryEngine::new(&db).search(&request)?;
    let mode = response.mode;

    let hits = ResultAssembler::new(&db).assemble(
        &args.query,
        response.matches,
        args.sort,
        &AssembleOptions {
            snippet_len: args.snippet_len,
            context_lines: args.context_lines,
            full_content: args.full_content,
        },
    )?;

    if args.json {
        let payload = json!({
            "mode": mode.as_str(),
            "results": hits,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if mode != SearchMode::FullText {
        eprintln!("(full-text index unavailable; using substring search)");
    }

    for hit in &hits {
        print_hit(hit);
    }

    Ok(())
}

fn print_hit(hit: &SearchHit) {
    let ts = hit
        .ts
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    let score = hit
        .score
        .map(|s| format!("{:.3}", s))
        .unwrap_or_else(|| "-".to_string());
    let session = &hit.session_id.as_str()[..8.min(hit.session_id.as_str().len())];

    println!(
        "{}  {}  {}  {}  {}",
        ts,
        score,
        session,
        hit.role.as_str(),
        hit.snippet
    );

    for event in &hit.context {
        let marker = if event.seq == hit.seq { ">" } else { " " };
        println!("  {} [{}] {}", marker, event.seq, event.content);
    }
}
