use trawl_types::{IndexState, now_rfc3339};

use crate::{Database, Error, Result};

const FTS_AVAILABLE_KEY: &str = "fts_available";
const FTS_READY_KEY: &str = "fts_index_ready";
const FTS_REBUILT_AT_KEY: &str = "fts_rebuilt_at";

const CREATE_FTS: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS events_fts USING fts5(
    content,
    content='events',
    content_rowid='rowid'
)
"#;

/// Manages the optional FTS5 index over stored events.
///
/// Availability is a property of the SQLite build, probed at runtime and
/// recorded in the meta table so queries in other processes see the same
/// state. The index is always rebuilt wholesale from the events table; there
/// is no incremental maintenance, which is why a sync that skips the rebuild
/// leaves the index marked stale.
pub struct IndexManager<'a> {
    db: &'a Database,
}

impl<'a> IndexManager<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Probe the full-text engine by creating the shadow table, and record
    /// the outcome. Returns whether the engine is usable at all.
    pub fn ensure_available(&self) -> bool {
        match self.db.conn().execute_batch(CREATE_FTS) {
            Ok(()) => {
                let _ = self.db.set_meta(FTS_AVAILABLE_KEY, "1");
                true
            }
            Err(_) => {
                let _ = self.db.set_meta(FTS_AVAILABLE_KEY, "0");
                false
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.db.get_meta(FTS_AVAILABLE_KEY), Ok(Some(v)) if v == "1")
    }

    pub fn state(&self) -> IndexState {
        IndexState {
            available: self.is_available(),
            ready: matches!(self.db.get_meta(FTS_READY_KEY), Ok(Some(v)) if v == "1"),
        }
    }

    /// Record that stored events changed without a rebuild, so queries must
    /// not trust the index until the next one.
    pub fn mark_stale(&self) -> Result<()> {
        self.db.set_meta(FTS_READY_KEY, "0")
    }

    /// Full replace of the FTS index from current stored events.
    ///
    /// Runs as one transaction so a concurrent reader sees either the old
    /// index or the new one, never a half-built state.
    pub fn rebuild(&self) -> Result<()> {
        if !self.ensure_available() {
            self.mark_stale()?;
            return Err(Error::FullText(
                "FTS5 is not available in this SQLite build".to_string(),
            ));
        }

        let rebuild_sql = format!(
            r#"
            DROP TABLE IF EXISTS events_fts;
            {};
            INSERT INTO events_fts(events_fts) VALUES('rebuild');
            "#,
            CREATE_FTS
        );

        let replaced = self
            .db
            .conn()
            .unchecked_transaction()
            .and_then(|tx| tx.execute_batch(&rebuild_sql).map(|_| tx))
            .and_then(|tx| tx.commit());

        if let Err(err) = replaced {
            self.mark_stale()?;
            return Err(Error::FullText(err.to_string()));
        }

        self.db.set_meta(FTS_READY_KEY, "1")?;
        self.db.set_meta(FTS_REBUILT_AT_KEY, &now_rfc3339())?;
        Ok(())
    }
}
