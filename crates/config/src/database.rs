//! Database configuration

use std::path::PathBuf;

use serde::Deserialize;

/// SQLite database configuration
///
/// ```toml
/// [database]
/// path = "data/wastedesk.db"
/// max_connections = 5
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file, created if missing
    pub path: PathBuf,

    /// Connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/wastedesk.db"),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("database.path must not be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("database.max_connections must be at least 1".to_string());
        }
        Ok(())
    }
}
