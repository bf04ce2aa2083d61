//! Configuration for sopdesk

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sopdesk")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for the SQLite database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Default page size for document listings
    #[serde(default = "default_page_limit")]
    pub default_page_limit: i64,

    /// How many version snapshots to return with a document by default
    #[serde(default = "default_version_history")]
    pub version_history_limit: i64,

    /// Default review interval for new documents, in days
    #[serde(default = "default_review_interval")]
    pub review_interval_days: i32,
}

fn default_page_limit() -> i64 {
    20
}

fn default_version_history() -> i64 {
    10
}

fn default_review_interval() -> i32 {
    90
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_page_limit: default_page_limit(),
            version_history_limit: default_version_history(),
            review_interval_days: default_review_interval(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the SQLite database path
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("sopdesk.db")
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_page_limit, 20);
        assert_eq!(config.version_history_limit, 10);
        assert_eq!(config.review_interval_days, 90);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.default_page_limit = 50;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.default_page_limit, 50);
    }
}
