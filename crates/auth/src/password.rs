//! Password hashing and verification
//!
//! Argon2id with a random per-password salt. Stored as a PHC string.

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{AuthError, Result};

/// Minimum length of a new password, in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password using Argon2id
///
/// Returns the hash in PHC format: `$argon2id$v=19$m=...,t=...,p=...$salt$hash`
///
/// ```
/// use wastedesk_auth::password::hash_password;
///
/// let hash = hash_password("collector-pass").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash
///
/// A mismatch is `Ok(false)`; only an unreadable hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(format!("stored hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswordHash(e.to_string())),
    }
}

/// Hash of a password no account can have, computed on first use
fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash_password("wastedesk-unused-password").ok())
        .as_deref()
}

/// Run a full verification against a throwaway hash
///
/// Lets a lookup miss cost the same as a wrong password. Always `false`.
pub fn verify_dummy(password: &str) -> bool {
    match dummy_hash() {
        Some(hash) => {
            let _ = verify_password(password, hash);
            false
        }
        None => false,
    }
}

/// Reject passwords shorter than [`MIN_PASSWORD_LEN`]
pub fn check_password_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}
