//! wastedesk configuration
//!
//! TOML-based configuration with sensible defaults. Every section is
//! optional; an empty file is a valid configuration.
//!
//! ```
//! use wastedesk_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[server]\nport = 9000").unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```
//!
//! # Environment overrides
//!
//! Secrets and deployment-specific values can be supplied through
//! `WASTEDESK_*` environment variables, applied on top of the file with
//! [`Config::with_env_overrides`]:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `WASTEDESK_HOST` | `server.host` |
//! | `WASTEDESK_PORT` | `server.port` |
//! | `WASTEDESK_JWT_ALGORITHM` | `auth.algorithm` |
//! | `WASTEDESK_JWT_SECRET` | `auth.hmac_secret` |
//! | `WASTEDESK_JWT_PRIVATE_KEY` | `auth.private_key_path` |
//! | `WASTEDESK_JWT_PUBLIC_KEY` | `auth.public_key_path` |
//! | `WASTEDESK_DATABASE_PATH` | `database.path` |
//! | `WASTEDESK_ADMIN_EMAIL` | `bootstrap.admin_email` |
//! | `WASTEDESK_ADMIN_PASSWORD` | `bootstrap.admin_password` |

mod auth;
mod bootstrap;
mod database;
mod error;
mod logging;
mod server;

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use auth::{AuthConfig, DEFAULT_ISSUER, JwtAlgorithm};
pub use bootstrap::BootstrapConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use server::ServerConfig;

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener
    pub server: ServerConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Token signing and authorization settings
    pub auth: AuthConfig,

    /// SQLite storage
    pub database: DatabaseConfig,

    /// First-run administrator
    pub bootstrap: BootstrapConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.server
            .validate()
            .map_err(|e| ConfigError::invalid_section("server", e))?;
        self.auth
            .validate()
            .map_err(|e| ConfigError::invalid_section("auth", e))?;
        self.database
            .validate()
            .map_err(|e| ConfigError::invalid_section("database", e))?;
        self.bootstrap
            .validate()
            .map_err(|e| ConfigError::invalid_section("bootstrap", e))?;
        Ok(())
    }

    /// Apply `WASTEDESK_*` process environment overrides and re-validate
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup and re-validate
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("WASTEDESK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("WASTEDESK_PORT") {
            self.server.port = port
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid_env("WASTEDESK_PORT", e.to_string()))?;
        }
        if let Some(algorithm) = lookup("WASTEDESK_JWT_ALGORITHM") {
            self.auth.algorithm = JwtAlgorithm::parse(&algorithm).ok_or_else(|| {
                ConfigError::invalid_env(
                    "WASTEDESK_JWT_ALGORITHM",
                    format!("unknown algorithm '{}', expected es256 or hs256", algorithm),
                )
            })?;
        }
        if let Some(secret) = lookup("WASTEDESK_JWT_SECRET") {
            self.auth.hmac_secret = Some(secret);
        }
        if let Some(path) = lookup("WASTEDESK_JWT_PRIVATE_KEY") {
            self.auth.private_key_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("WASTEDESK_JWT_PUBLIC_KEY") {
            self.auth.public_key_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("WASTEDESK_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(email) = lookup("WASTEDESK_ADMIN_EMAIL") {
            self.bootstrap.admin_email = Some(email);
        }
        if let Some(password) = lookup("WASTEDESK_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = Some(password);
        }

        self.validate()?;
        Ok(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
