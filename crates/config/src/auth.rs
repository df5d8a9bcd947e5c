//! Authentication configuration
//!
//! Tokens are signed with ES256 (P-256) by default. HS256 with a shared
//! secret is accepted for development and tests.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Default token issuer
pub const DEFAULT_ISSUER: &str = "waste.mysterchat.com";

/// Minimum HMAC secret length
const MIN_SECRET_LEN: usize = 32;

/// JWT signing algorithm
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JwtAlgorithm {
    /// ECDSA over P-256 with SHA-256
    #[default]
    Es256,
    /// HMAC with SHA-256
    Hs256,
}

impl JwtAlgorithm {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "es256" => Some(Self::Es256),
            "hs256" => Some(Self::Hs256),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es256 => "es256",
            Self::Hs256 => "hs256",
        }
    }
}

/// Authentication configuration
///
/// # Example
///
/// ```toml
/// [auth]
/// algorithm = "es256"
/// private_key_path = "internal/assets/dev/jwt/privkey.pem"
/// public_key_path = "internal/assets/dev/jwt/pubkey.pem"
/// permission_timeout = "50ms"
/// ```
///
/// ```toml
/// [auth]
/// algorithm = "hs256"
/// hmac_secret = "your-secret-key-at-least-32-characters-long"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Signing algorithm
    /// Default: es256
    pub algorithm: JwtAlgorithm,

    /// Shared secret for HS256 (at least 32 characters)
    pub hmac_secret: Option<String>,

    /// SEC1 or PKCS#8 PEM private key for ES256
    pub private_key_path: PathBuf,

    /// PKIX PEM public key for ES256
    pub public_key_path: PathBuf,

    /// Value of the `iss` claim
    /// Default: "waste.mysterchat.com"
    pub issuer: String,

    /// Upper bound on the effective-permission lookup per request
    /// Default: 50ms
    #[serde(with = "humantime_serde")]
    pub permission_timeout: Duration,

    /// Minimum token level for bearer-guarded routes
    /// Default: 4
    pub min_level: u8,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: JwtAlgorithm::Es256,
            hmac_secret: None,
            private_key_path: PathBuf::from("internal/assets/dev/jwt/privkey.pem"),
            public_key_path: PathBuf::from("internal/assets/dev/jwt/pubkey.pem"),
            issuer: DEFAULT_ISSUER.to_string(),
            permission_timeout: Duration::from_millis(50),
            min_level: 4,
        }
    }
}

impl AuthConfig {
    /// HMAC secret bytes, if configured
    pub fn hmac_secret_bytes(&self) -> Option<&[u8]> {
        self.hmac_secret.as_ref().map(|s| s.as_bytes())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.issuer.trim().is_empty() {
            return Err("auth.issuer must not be empty".to_string());
        }
        if self.permission_timeout.is_zero() {
            return Err("auth.permission_timeout must be greater than zero".to_string());
        }

        match self.algorithm {
            JwtAlgorithm::Hs256 => {
                let Some(secret) = self.hmac_secret.as_ref() else {
                    return Err("auth.hmac_secret is required when algorithm = \"hs256\"".to_string());
                };
                if secret.len() < MIN_SECRET_LEN {
                    return Err(format!(
                        "auth.hmac_secret must be at least {} characters",
                        MIN_SECRET_LEN
                    ));
                }
            }
            JwtAlgorithm::Es256 => {
                if self.private_key_path.as_os_str().is_empty()
                    || self.public_key_path.as_os_str().is_empty()
                {
                    return Err(
                        "auth.private_key_path and auth.public_key_path are required for es256"
                            .to_string(),
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.algorithm, JwtAlgorithm::Es256);
        assert_eq!(config.issuer, "waste.mysterchat.com");
        assert_eq!(config.permission_timeout, Duration::from_millis(50));
        assert_eq!(config.min_level, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hs256_requires_secret() {
        let config = AuthConfig {
            algorithm: JwtAlgorithm::Hs256,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("hmac_secret is required"));
    }

    #[test]
    fn test_hs256_short_secret() {
        let config = AuthConfig {
            algorithm: JwtAlgorithm::Hs256,
            hmac_secret: Some("too-short".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("at least 32"));
    }

    #[test]
    fn test_deserialize() {
        let toml = r#"
algorithm = "hs256"
hmac_secret = "0123456789abcdef0123456789abcdef"
issuer = "tests"
permission_timeout = "20ms"
"#;
        let config: AuthConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.algorithm, JwtAlgorithm::Hs256);
        assert_eq!(config.issuer, "tests");
        assert_eq!(config.permission_timeout, Duration::from_millis(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = AuthConfig {
            permission_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!(JwtAlgorithm::parse("ES256"), Some(JwtAlgorithm::Es256));
        assert_eq!(JwtAlgorithm::parse("hs256"), Some(JwtAlgorithm::Hs256));
        assert_eq!(JwtAlgorithm::parse("rs256"), None);
    }
}
