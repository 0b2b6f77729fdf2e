use clap::{Parser, Subcommand, ValueEnum};
use trawl_types::SortOrder;

#[derive(Parser)]
#[command(
    name = "trawl",
    about = "Index and search your local AI agent session logs",
    version
)]
pub struct Cli {
    #[arg(long, global = true, help = "Data directory (default: platform data dir)")]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Scan session logs and update the index")]
    Refresh {
        #[arg(long, help = "Sessions directory (default: ~/.codex/sessions)")]
        sessions_dir: Option<String>,

        #[arg(long, help = "Drop all ingested data and re-ingest everything")]
        full: bool,

        #[arg(long, help = "Skip the full-text index rebuild after ingest")]
        no_reindex: bool,

        #[arg(long, help = "Report per-session progress")]
        verbose: bool,
    },

    #[command(about = "Search ingested events")]
    Search {
        #[arg(help = "Search query")]
        query: String,

        #[arg(long, default_value = "20")]
        limit: usize,

        #[arg(long, help = "Include assistant messages")]
        include_assistant: bool,

        #[arg(long, help = "Include internal events (reasoning, tool output)")]
        include_internal: bool,

        #[arg(long, value_enum, default_value = "relevance")]
        sort: SortArg,

        #[arg(long, default_value = "180", help = "Maximum snippet length")]
        snippet_len: usize,

        #[arg(long, default_value = "0", help = "Surrounding events to show per match")]
        context: usize,

        #[arg(long, help = "Print complete event content instead of snippets")]
        full_content: bool,

        #[arg(long, help = "Run refresh before searching")]
        refresh: bool,

        #[arg(long, help = "Used with --refresh")]
        sessions_dir: Option<String>,

        #[arg(long, help = "Used with --refresh: skip the index rebuild")]
        no_reindex: bool,

        #[arg(long, help = "Output JSON")]
        json: bool,
    },

    #[command(about = "List indexed sessions")]
    Sessions {
        #[arg(long, default_value = "50")]
        limit: usize,

        #[arg(long, help = "Output JSON")]
        json: bool,
    },

    #[command(about = "Show index statistics")]
    Stats {
        #[arg(long, help = "Output JSON")]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Relevance,
    Recent,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Relevance => SortOrder::Relevance,
            SortArg::Recent => SortOrder::Recent,
        }
    }
}
