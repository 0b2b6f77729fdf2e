// NOTE: trawl Architecture Rationale
//
// Why an ingestion cursor per file (not re-parse on every run)?
// - Session logs are append-only in the common case; re-reading gigabytes of
//   unchanged history on every refresh would make the tool unusable
// - size/mtime gives an O(1) skip for untouched files; the prefix
//   fingerprint catches the uncommon truncate-and-rewrite case
// - Cursor advance is the commit signal: events first, cursor second, in one
//   transaction, so an interrupted run never skips unstored lines
//
// Why tolerant per-line parsing (not a strict schema)?
// - Log record shapes change without notice across CLI versions
// - One malformed line must cost one line, not a session or a refresh
// - Unrecognized shapes are kept as opaque text so they remain searchable
//
// Why two query strategies behind one interface?
// - FTS5 is a property of the SQLite build; when it is missing or the index
//   is stale the same search must still answer via a substring scan
// - Selection happens at call time from recorded index state, never from a
//   process-global flag

pub mod assemble;
pub mod config;
pub mod error;
pub mod parser;
pub mod query;
pub mod scanner;
pub mod sync;

pub use assemble::{AssembleOptions, ResultAssembler};
pub use error::{Error, Result};
pub use query::{FullTextStrategy, QueryEngine, QueryStrategy, SearchResponse, SubstringStrategy};
pub use scanner::{ScanWarning, scan};
pub use sync::{SyncEngine, SyncProgress};
