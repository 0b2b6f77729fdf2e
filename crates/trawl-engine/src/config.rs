use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Resolve the data directory path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. TRAWL_PATH environment variable (with tilde expansion)
/// 3. XDG data directory (recommended default)
/// 4. ~/.trawl (fallback for systems without XDG)
pub fn resolve_data_dir(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("TRAWL_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("trawl"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".trawl"));
    }

    Err(Error::Config(
        "Could not determine data directory: no HOME directory or XDG data directory found"
            .to_string(),
    ))
}

/// Resolve the sessions root based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. TRAWL_SESSIONS_DIR environment variable
/// 3. `sessions_root` from config.toml
/// 4. ~/.codex/sessions
pub fn resolve_sessions_root(explicit_path: Option<&str>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("TRAWL_SESSIONS_DIR") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(root) = &config.sessions_root {
        return Ok(root.clone());
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".codex").join("sessions"));
    }

    Err(Error::Config(
        "Could not determine sessions root: pass --sessions-dir or set TRAWL_SESSIONS_DIR"
            .to_string(),
    ))
}

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("index.db")
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sessions_root: Option<PathBuf>,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.sessions_root.is_none());
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = Config {
            sessions_root: Some(PathBuf::from("/var/logs/sessions")),
        };

        config.save_to(&config_path)?;
        assert!(config_path.exists());

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(
            loaded.sessions_root,
            Some(PathBuf::from("/var/logs/sessions"))
        );

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path)?;
        assert!(config.sessions_root.is_none());

        Ok(())
    }

    #[test]
    fn test_explicit_path_wins() {
        let config = Config {
            sessions_root: Some(PathBuf::from("/from/config")),
        };
        let resolved = resolve_sessions_root(Some("/explicit"), &config).unwrap();
        assert_eq!(resolved, PathBuf::from("/explicit"));
    }
}
