use anyhow::Result;

use crate::args::{Cli, Commands};
use crate::context::ExecutionContext;
use crate::handlers;

pub fn run(cli: Cli) -> Result<()> {
    let ctx = ExecutionContext::new(cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Refresh {
            sessions_dir,
            full,
            no_reindex,
            verbose,
        } => handlers::refresh::handle(&ctx, sessions_dir.as_deref(), full, !no_reindex, verbose),

        Commands::Search {
            query,
            limit,
            include_assistant,
            include_internal,
            sort,
            snippet_len,
            context,
            full_content,
            refresh,
            sessions_dir,
            no_reindex,
            json,
        } => handlers::search::handle(
            &ctx,
            handlers::search::SearchArgs {
                query,
                limit,
                include_assistant,
                include_internal,
                sort: sort.into(),
                snippet_len,
                context_lines: context,
                full_content,
                refresh,
                sessions_dir,
                reindex: !no_reindex,
                json,
            },
        ),

        Commands::Sessions { limit, json } => handlers::sessions::handle(&ctx, limit, json),

        Commands::Stats { json } => handlers::stats::handle(&ctx, json),
    }
}
