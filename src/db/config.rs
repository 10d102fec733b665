// src/db/config.rs
//
// Database configuration
//
// Defaults mirror a desktop install: one file under the user's data
// directory, a small pool and a busy timeout so concurrent writers wait
// instead of failing immediately.

use std::path::PathBuf;

use log::debug;

use crate::error::{DataAccessError, DataResult};

pub const ENV_DATABASE_PATH: &str = "MOVIEDB_DATABASE_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "MOVIEDB_MAX_CONNECTIONS";
pub const ENV_BUSY_TIMEOUT_MS: &str = "MOVIEDB_BUSY_TIMEOUT_MS";

const DEFAULT_DB_DIRNAME: &str = "moviedb";
const DEFAULT_DB_FILENAME: &str = "moviedb.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 15;
const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,

    /// Upper bound for pooled connections
    pub max_connections: u32,

    /// How long a statement waits on a locked database
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_path(default_database_path())
    }
}

impl DatabaseConfig {
    /// Default settings pointed at a specific database file
    pub fn in_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// Defaults overridden by `MOVIEDB_*` environment variables
    pub fn from_env() -> DataResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> DataResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            config.path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            config.max_connections = parse_number(ENV_MAX_CONNECTIONS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = parse_number(ENV_BUSY_TIMEOUT_MS, &raw)?;
        }

        config.validate()?;
        debug!("Database configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> DataResult<()> {
        if self.max_connections == 0 {
            return Err(DataAccessError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err(DataAccessError::Config(
                "database path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create the directory holding the database file if it is missing
    pub fn ensure_parent_dir(&self) -> DataResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// `{APP_DATA}/moviedb/moviedb.db`, or the working directory when the
/// platform has no data directory.
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(DEFAULT_DB_DIRNAME))
        .unwrap_or_default()
        .join(DEFAULT_DB_FILENAME)
}

fn parse_number(key: &str, raw: &str) -> DataResult<u32> {
    raw.trim().parse::<u32>().map_err(|e| {
        DataAccessError::Config(format!("{} must be a number, got '{}': {}", key, raw, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_path_ends_with_database_file() {
        let config = DatabaseConfig::default();
        assert!(config.path.ends_with("moviedb/moviedb.db") || config.path.ends_with("moviedb.db"));
        assert_eq!(config.max_connections, 15);
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_environment_overrides() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE_PATH, "/tmp/movies.db"),
            (ENV_MAX_CONNECTIONS, "4"),
            (ENV_BUSY_TIMEOUT_MS, " 250 "),
        ]))
        .unwrap();

        assert_eq!(config.path, PathBuf::from("/tmp/movies.db"));
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_unparsable_value_is_config_error() {
        let result = DatabaseConfig::from_lookup(lookup_from(&[(ENV_MAX_CONNECTIONS, "many")]));
        assert!(matches!(result, Err(DataAccessError::Config(_))));
    }

    #[test]
    fn test_zero_connections_rejected() {
        let result = DatabaseConfig::from_lookup(lookup_from(&[(ENV_MAX_CONNECTIONS, "0")]));
        assert!(matches!(result, Err(DataAccessError::Config(_))));
    }

    #[test]
    fn test_ensure_parent_dir_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::in_path(dir.path().join("nested/deeper/movies.db"));

        config.ensure_parent_dir().unwrap();

        assert!(dir.path().join("nested/deeper").is_dir());
    }
}
