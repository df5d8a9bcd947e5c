//! Authentication error types

use std::io;
use thiserror::Error;

/// Result type for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Coarse classification every [`AuthError`] maps onto
///
/// Transport layers turn these into status codes; nothing else should
/// inspect individual variants to decide how to respond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing, malformed, invalid or expired credentials
    Unauthenticated,
    /// Valid identity without the required privilege
    Forbidden,
    /// Malformed input
    InvalidRequest,
    /// Referenced entity does not exist
    NotFound,
    /// Signing, key or storage failure
    Internal,
}

/// Errors that can occur during authentication and authorization
#[derive(Debug, Error)]
pub enum AuthError {
    // Token errors
    /// No token was supplied
    #[error("missing token")]
    MissingToken,

    /// Token could not be decoded
    #[error("invalid token format")]
    InvalidTokenFormat,

    /// Signature verification failed
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// Token is not yet valid (nbf claim)
    #[error("token not yet valid")]
    TokenNotYetValid,

    /// Token claims are invalid (issuer, subject, missing fields)
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),

    /// Audience claim absent or not of the form `prefix:level`
    #[error("token audience is missing or malformed")]
    MalformedAudience,

    /// Level after the colon is not an integer
    #[error("invalid token level '{0}'")]
    InvalidLevel(String),

    // Credential errors
    /// Unknown email, wrong password or inactive account
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Old password did not match on password change
    #[error("old password is incorrect")]
    IncorrectPassword,

    /// New password too short
    #[error("new password must be at least {min} characters")]
    WeakPassword {
        /// Minimum length in characters
        min: usize,
    },

    /// Account exists but is not active
    #[error("account is not active")]
    AccountInactive,

    /// A role, status or permission string could not be parsed
    #[error("invalid {field} '{value}'")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: String,
    },

    // Lookup errors
    /// Staff record not found (or tombstoned)
    #[error("staff {0} not found")]
    StaffNotFound(i64),

    /// Role not found
    #[error("role '{0}' not found")]
    RoleNotFound(String),

    /// Unique constraint hit
    #[error("{0} already exists")]
    AlreadyExists(String),

    // Internal errors
    /// Token signing failed
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// Key material could not be loaded or generated
    #[error("key error: {0}")]
    KeyError(String),

    /// Failed to read or write a key file
    #[error("failed to access '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Password hashing failed
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// Database operation failed
    #[error("database error: {0}")]
    DatabaseError(String),

    /// Permission lookup exceeded its time budget
    #[error("permission lookup timed out after {0:?}")]
    LookupTimeout(std::time::Duration),
}

impl AuthError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingToken
            | Self::InvalidTokenFormat
            | Self::InvalidSignature
            | Self::TokenExpired
            | Self::TokenNotYetValid
            | Self::InvalidClaims(_)
            | Self::InvalidLevel(_)
            | Self::InvalidCredentials
            | Self::IncorrectPassword => ErrorKind::Unauthenticated,
            Self::AccountInactive => ErrorKind::Forbidden,
            Self::MalformedAudience
            | Self::WeakPassword { .. }
            | Self::InvalidValue { .. }
            | Self::AlreadyExists(_) => ErrorKind::InvalidRequest,
            Self::StaffNotFound(_) | Self::RoleNotFound(_) => ErrorKind::NotFound,
            Self::Signing(_)
            | Self::KeyError(_)
            | Self::IoError { .. }
            | Self::PasswordHash(_)
            | Self::DatabaseError(_)
            | Self::LookupTimeout(_) => ErrorKind::Internal,
        }
    }

    /// Create an IoError
    pub fn io_error(path: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_are_unauthenticated() {
        for err in [
            AuthError::MissingToken,
            AuthError::InvalidTokenFormat,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::TokenNotYetValid,
            AuthError::InvalidLevel("x".to_string()),
        ] {
            assert_eq!(err.kind(), ErrorKind::Unauthenticated, "{}", err);
        }
    }

    #[test]
    fn test_malformed_audience_is_invalid_request() {
        assert_eq!(AuthError::MalformedAudience.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_credential_messages() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid email or password"
        );
        assert_eq!(
            AuthError::WeakPassword { min: 8 }.to_string(),
            "new password must be at least 8 characters"
        );
        assert_eq!(AuthError::AccountInactive.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_io_error() {
        let err = AuthError::io_error(
            "/keys/privkey.pem",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("/keys/privkey.pem"));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_not_found_kinds() {
        assert_eq!(AuthError::StaffNotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(
            AuthError::RoleNotFound("Auditor".to_string()).kind(),
            ErrorKind::NotFound
        );
    }
}
