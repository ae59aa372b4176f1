//! Configuration for the beatmap database

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default file name of the SQLite database inside the storage directory
pub const DEFAULT_DATABASE_NAME: &str = "beatmaps.db";

/// Configuration for osu-import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding the database and the content store
    pub storage_path: PathBuf,
    /// File name of the SQLite database inside `storage_path`
    #[serde(default = "default_database_name")]
    pub database_name: String,
}

fn default_database_name() -> String {
    DEFAULT_DATABASE_NAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            database_name: default_database_name(),
        }
    }
}

/// Platform data directory for osu-import, falling back to the working directory
pub fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("osu-import"))
        .unwrap_or_else(|| PathBuf::from("osu-import"))
}

impl Config {
    /// Create a config rooted at the given storage directory
    pub fn with_storage_path(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            ..Self::default()
        }
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("osu-import").join("config.json"))
    }

    /// Load config from disk, falling back to defaults if not found
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| std::fs::read_to_string(&path).ok())
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| Error::Config("No config directory on this platform".to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Full path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.storage_path.join(&self.database_name)
    }
}
