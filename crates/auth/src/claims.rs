//! JWT token claims
//!
//! One claim shape is issued and accepted: the standard registered claims,
//! an audience entry carrying the privilege level, and a snapshot of the
//! staff identity.
//!
//! ```text
//! {
//!   "sub": "1", "iss": "waste.mysterchat.com",
//!   "iat": 1700000000, "nbf": 1700000000, "exp": 1700086400,
//!   "aud": ["staff:9"],
//!   "staff_id": 1, "email": "admin@system.com",
//!   "role": "admin", "status": "active"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::staff::{Principal, StaffRole, StaffStatus};

/// Fixed token lifetime (24 hours)
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Prefix of the level-bearing audience entry
pub const AUDIENCE_PREFIX: &str = "staff";

/// Claims carried by every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (staff ID as string)
    #[serde(rename = "sub")]
    pub subject: String,

    /// Issuer
    #[serde(rename = "iss")]
    pub issuer: String,

    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Not before (Unix timestamp)
    #[serde(rename = "nbf")]
    pub not_before: i64,

    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// Audience, first entry is `staff:<level>`
    #[serde(rename = "aud", default, skip_serializing_if = "Vec::is_empty")]
    pub audience: Vec<String>,

    pub staff_id: i64,
    pub email: String,
    pub role: StaffRole,
    pub status: StaffStatus,
}

impl TokenClaims {
    /// Build claims for a principal issued at `now` (Unix seconds)
    pub fn for_principal(principal: &Principal, issuer: &str, now: i64) -> Self {
        Self {
            subject: principal.id.to_string(),
            issuer: issuer.to_string(),
            issued_at: now,
            not_before: now,
            expires_at: now + TOKEN_TTL_SECS,
            audience: vec![level_audience(principal.role.level())],
            staff_id: principal.id,
            email: principal.email.clone(),
            role: principal.role,
            status: principal.status,
        }
    }

    /// Privilege level from the audience claim
    pub fn level(&self) -> Result<i64> {
        extract_level(&self.audience)
    }

    /// Staff ID parsed from the subject claim
    pub fn subject_id(&self) -> Result<i64> {
        self.subject
            .parse()
            .map_err(|_| AuthError::InvalidClaims(format!("subject '{}' is not a staff id", self.subject)))
    }

    /// Identity snapshot
    pub fn principal(&self) -> Principal {
        Principal::new(self.staff_id, &self.email, self.role, self.status)
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < chrono::Utc::now().timestamp()
    }
}

/// Render the audience entry for a level
pub fn level_audience(level: u8) -> String {
    format!("{}:{}", AUDIENCE_PREFIX, level)
}

/// Extract the privilege level from an audience claim
///
/// The first entry must look like `prefix:level`. A missing or colon-less
/// entry is [`AuthError::MalformedAudience`]; a non-integer level is
/// [`AuthError::InvalidLevel`]. Any `i64` is accepted, including values
/// above the highest role level.
pub fn extract_level(audience: &[String]) -> Result<i64> {
    let first = audience.first().ok_or(AuthError::MalformedAudience)?;

    let mut parts = first.split(':');
    let _prefix = parts.next();
    let level = parts.next().ok_or(AuthError::MalformedAudience)?;

    level
        .trim()
        .parse()
        .map_err(|_| AuthError::InvalidLevel(level.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal::new(1, "admin@system.com", StaffRole::Admin, StaffStatus::Active)
    }

    #[test]
    fn test_for_principal() {
        let claims = TokenClaims::for_principal(&principal(), "waste.mysterchat.com", 1_700_000_000);
        assert_eq!(claims.subject, "1");
        assert_eq!(claims.issued_at, claims.not_before);
        assert_eq!(claims.expires_at - claims.issued_at, 86_400);
        assert_eq!(claims.audience, vec!["staff:9".to_string()]);
        assert_eq!(claims.level().unwrap(), 9);
        assert_eq!(claims.subject_id().unwrap(), 1);
        assert_eq!(claims.principal(), principal());
    }

    #[test]
    fn test_wire_names() {
        let claims = TokenClaims::for_principal(&principal(), "iss", 10);
        let value = serde_json::to_value(&claims).unwrap();
        for key in ["sub", "iss", "iat", "nbf", "exp", "aud", "staff_id", "email", "role", "status"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["role"], "admin");
        assert_eq!(value["status"], "active");
    }

    #[test]
    fn test_extract_level() {
        assert_eq!(extract_level(&["staff:4".to_string()]).unwrap(), 4);
        assert_eq!(extract_level(&["x:7:extra".to_string()]).unwrap(), 7);
        // Wider than any role level, still a level
        assert_eq!(extract_level(&["staff:300".to_string()]).unwrap(), 300);
        assert_eq!(extract_level(&["staff:-1".to_string()]).unwrap(), -1);
    }

    #[test]
    fn test_extract_level_missing() {
        assert!(matches!(extract_level(&[]), Err(AuthError::MalformedAudience)));
        assert!(matches!(
            extract_level(&["staff".to_string()]),
            Err(AuthError::MalformedAudience)
        ));
    }

    #[test]
    fn test_extract_level_not_a_number() {
        assert!(matches!(
            extract_level(&["staff:high".to_string()]),
            Err(AuthError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_subject_not_numeric() {
        let mut claims = TokenClaims::for_principal(&principal(), "iss", 10);
        claims.subject = "abc".to_string();
        assert!(matches!(claims.subject_id(), Err(AuthError::InvalidClaims(_))));
    }

    #[test]
    fn test_token_expired() {
        let claims = TokenClaims::for_principal(&principal(), "iss", 0);
        assert!(claims.is_expired());
    }
}
