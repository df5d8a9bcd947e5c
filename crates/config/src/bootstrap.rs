//! First-run administrator account

use serde::Deserialize;

/// Minimum password length accepted for the bootstrap admin
const MIN_PASSWORD_LEN: usize = 8;

/// Administrator created at startup when missing
///
/// Both fields must be set for bootstrapping to run.
///
/// ```toml
/// [bootstrap]
/// admin_email = "admin@system.com"
/// admin_password = "change-me-please"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl BootstrapConfig {
    /// Email and password when both are configured
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => {
                if !email.contains('@') {
                    return Err(format!("bootstrap.admin_email '{}' is not an email", email));
                }
                if password.chars().count() < MIN_PASSWORD_LEN {
                    return Err(format!(
                        "bootstrap.admin_password must be at least {} characters",
                        MIN_PASSWORD_LEN
                    ));
                }
                Ok(())
            }
            (None, None) => Ok(()),
            _ => Err("bootstrap.admin_email and bootstrap.admin_password must be set together"
                .to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_valid() {
        let config = BootstrapConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.admin_credentials().is_none());
    }

    #[test]
    fn test_half_configured_rejected() {
        let config = BootstrapConfig {
            admin_email: Some("admin@system.com".to_string()),
            admin_password: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_password_rejected() {
        let config = BootstrapConfig {
            admin_email: Some("admin@system.com".to_string()),
            admin_password: Some("short".to_string()),
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("at least 8"));
    }

    #[test]
    fn test_credentials() {
        let config = BootstrapConfig {
            admin_email: Some("admin@system.com".to_string()),
            admin_password: Some("admin-password".to_string()),
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.admin_credentials(),
            Some(("admin@system.com", "admin-password"))
        );
    }
}
