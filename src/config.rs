use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DbError, Result};

/// Open options for a [`Db`](crate::Db) connection, parsed from a TOML
/// file or built in code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Database file path. `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    /// Enforce foreign key constraints (`PRAGMA foreign_keys = ON`).
    pub foreign_keys: bool,
    /// Busy handler timeout in milliseconds. `None` keeps the driver
    /// default of failing immediately on a locked database.
    pub busy_timeout_ms: Option<u64>,
    /// Log every executed statement together with its parameters.
    pub verbose: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            path: None,
            foreign_keys: true,
            busy_timeout_ms: None,
            verbose: false,
        }
    }
}

impl DbConfig {
    /// In-memory database with default pragmas.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// File-backed database at `path` with default pragmas.
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        DbConfig {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Loads configuration from a TOML file at the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - The file path to the TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| DbError::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
path = "articles.db"
foreign_keys = true
busy_timeout_ms = 5000
verbose = true
"#;

    #[test]
    fn test_load_config_from_str() {
        let config = DbConfig::from_toml(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.path.unwrap(), PathBuf::from("articles.db"));
        assert!(config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, Some(5000));
        assert!(config.verbose);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = DbConfig::from_toml("").expect("Failed to parse empty config");
        assert!(config.path.is_none());
        assert!(config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, None);
        assert!(!config.verbose);
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let err = DbConfig::from_toml("path = [not toml").unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn test_constructors() {
        assert!(DbConfig::in_memory().path.is_none());
        assert_eq!(
            DbConfig::file("data.db").path,
            Some(PathBuf::from("data.db"))
        );
    }
}
