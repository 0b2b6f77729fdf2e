use anyhow::Result;

use trawl_engine::{SyncEngine, SyncProgress};
use trawl_types::SyncMode;

use crate::context::ExecutionContext;

pub fn handle(
    ctx: &ExecutionContext,
    sessions_dir: Option<&str>,
    full: bool,
    reindex: bool,
    verbose: bool,
) -> Result<()> {
    let sessions_root = ctx.sessions_root(sessions_dir)?;
    let db = ctx.open_db()?;

    let mode = if full {
        SyncMode::Full
    } else {
        SyncMode::Incremental
    };

    let report = SyncEngine::new(&db, &sessions_root).sync(mode, reindex, |progress| {
        if verbose {
            print_progress(&progress);
        }
    })?;

    println!(
        "scanned={} changed={} lines_read={} lines_skipped={} events={} fts_available={} fts_reindexed={}",
        report.sessions_scanned,
        report.sessions_changed,
        report.lines_read,
        report.lines_skipped,
        report.events_ingested,
        report.fts_available as u8,
        report.fts_reindexed as u8,
    );

    if let Some(warning) = &report.index_warning {
        eprintln!("warning: {}", warning);
    }
    for error in &report.errors {
        eprintln!(
            "warning: skipped {}: {}",
            error.path.as_deref().unwrap_or("<unknown>"),
            error.message
        );
    }

    Ok(())
}

fn print_progress(progress: &SyncProgress) {
    match progress {
        SyncProgress::ScanStarted { root } => {
            println!("scanning {}", root.display());
        }
        SyncProgress::SessionIngested {
            path,
            events,
            reset,
        } => {
            let how = if *reset { "re-ingested" } else { "appended" };
            println!("{} {} ({} events)", how, path.display(), events);
        }
        SyncProgress::SessionUnchanged { path } => {
            println!("unchanged {}", path.display());
        }
        SyncProgress::SourceSkipped { path, message } => {
            let shown = path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            println!("skipped {} ({})", shown, message);
        }
        SyncProgress::IndexRebuilt => println!("full-text index rebuilt"),
        SyncProgress::IndexStale => println!("full-text index left stale (no reindex)"),
        SyncProgress::IndexUnavailable { message } => {
            println!("full-text index unavailable: {}", message);
        }
        SyncProgress::Completed { .. } => {}
    }
}
