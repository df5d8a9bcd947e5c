//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A section failed validation
    #[error("invalid [{section}] config: {message}")]
    InvalidSection {
        /// Section name without brackets (e.g. "auth")
        section: &'static str,
        /// What is wrong
        message: String,
    },

    /// An environment override could not be parsed
    #[error("invalid value for environment variable {var}: {message}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create an InvalidSection error
    pub fn invalid_section(section: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidSection {
            section,
            message: message.into(),
        }
    }

    /// Create an InvalidEnv error
    pub fn invalid_env(var: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidEnv {
            var,
            message: message.into(),
        }
    }
}
