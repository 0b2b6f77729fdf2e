// SQLite event index
// Stores parsed events plus the per-file ingestion cursors that make
// repeated syncs incremental.

mod db;
mod error;
mod fts;
mod queries;
mod records;
mod schema;

// Public API
pub use db::Database;
pub use error::{Error, Result};
pub use fts::IndexManager;
pub use records::SessionCursor;
