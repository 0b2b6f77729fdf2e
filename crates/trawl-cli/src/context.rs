use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use trawl_engine::config::{self, Config};
use trawl_index::Database;

/// Resolved paths and configuration shared by all commands.
pub struct ExecutionContext {
    pub data_dir: PathBuf,
    pub config: Config,
}

impl ExecutionContext {
    pub fn new(data_dir_flag: Option<&str>) -> Result<Self> {
        let data_dir = config::resolve_data_dir(data_dir_flag)?;
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
        let config = Config::load_from(&Config::default_path(&data_dir))?;

        Ok(Self { data_dir, config })
    }

    pub fn sessions_root(&self, explicit: Option<&str>) -> Result<PathBuf> {
        Ok(config::resolve_sessions_root(explicit, &self.config)?)
    }

    /// Open the index, creating it if needed. Used by writing commands.
    pub fn open_db(&self) -> Result<Database> {
        let path = config::db_path(&self.data_dir);
        Database::open(&path)
            .with_context(|| format!("Failed to open index database {}", path.display()))
    }

    /// Open the index for a read command; a missing database is an error the
    /// user can act on, not an empty result set.
    pub fn open_existing_db(&self) -> Result<Database> {
        let path = config::db_path(&self.data_dir);
        if !path.exists() {
            bail!(
                "index database not found at {}; run `trawl refresh` first",
                path.display()
            );
        }
        Ok(Database::open(&path)?)
    }
}
