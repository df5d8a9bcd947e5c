//! Test utilities
//!
//! Real signed tokens and real (in-memory) stores, so tests exercise the
//! same validation and query paths as production.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::claims::TokenClaims;
use crate::credential_store::{CredentialStore, SqliteCredentialStore};
use crate::database::Database;
use crate::keys::SigningKeys;
use crate::permission_store::{PermissionStore, SqlitePermissionStore};
use crate::staff::{NewStaff, Principal, StaffRole, StaffStatus};
use crate::token::{DEFAULT_ISSUER, TokenService};

/// Test secret for JWT signing (32 bytes for HS256)
pub const TEST_SECRET: &[u8] = b"test-secret-key-32-bytes-long!!!";

/// Password given to every staff member created by [`TestStores::add_staff`]
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// HS256 token service with the default issuer
pub fn test_token_service() -> TokenService {
    TokenService::new(SigningKeys::hs256(TEST_SECRET), DEFAULT_ISSUER)
}

/// Issue a valid token for a principal
///
/// ```
/// use wastedesk_auth::test_utils::{test_token, test_token_service};
/// use wastedesk_auth::{Principal, StaffRole, StaffStatus};
///
/// let principal = Principal::new(7, "d@x.com", StaffRole::Driver, StaffStatus::Active);
/// let token = test_token(&principal);
/// assert!(test_token_service().validate(&token).is_ok());
/// ```
pub fn test_token(principal: &Principal) -> String {
    test_token_service()
        .issue(principal)
        .expect("failed to issue test token")
        .token
}

/// Token that expired an hour ago
pub fn expired_token(principal: &Principal) -> String {
    test_token_service()
        .issue_at(principal, Utc::now() - Duration::hours(25))
        .expect("failed to issue test token")
        .token
}

/// Token signed with a different secret
pub fn foreign_token(principal: &Principal) -> String {
    TokenService::new(
        SigningKeys::hs256(b"another-secret-that-is-32-bytes!"),
        DEFAULT_ISSUER,
    )
    .issue(principal)
    .expect("failed to issue test token")
    .token
}

/// Token with a custom audience, signed with [`TEST_SECRET`]
pub fn token_with_audience(principal: &Principal, audience: Vec<String>) -> String {
    let mut claims = TokenClaims::for_principal(principal, DEFAULT_ISSUER, Utc::now().timestamp());
    claims.audience = audience;
    test_token_service()
        .sign(&claims)
        .expect("failed to sign test token")
}

/// Token whose subject is not a staff id
pub fn token_with_subject(principal: &Principal, subject: &str) -> String {
    let mut claims = TokenClaims::for_principal(principal, DEFAULT_ISSUER, Utc::now().timestamp());
    claims.subject = subject.to_string();
    test_token_service()
        .sign(&claims)
        .expect("failed to sign test token")
}

/// In-memory database with both stores, canonical permissions seeded
pub struct TestStores {
    pub database: Database,
    pub credentials: Arc<SqliteCredentialStore>,
    pub permissions: Arc<SqlitePermissionStore>,
}

impl TestStores {
    pub async fn new() -> Self {
        let database = Database::in_memory()
            .await
            .expect("failed to open in-memory database");
        let credentials = Arc::new(SqliteCredentialStore::new(database.pool().clone()));
        let permissions = Arc::new(SqlitePermissionStore::new(database.pool().clone()));
        permissions
            .ensure_canonical_permissions()
            .await
            .expect("failed to seed permissions");

        Self {
            database,
            credentials,
            permissions,
        }
    }

    /// Create a staff member with [`TEST_PASSWORD`]
    pub async fn add_staff(&self, email: &str, role: StaffRole, status: StaffStatus) -> Principal {
        self.credentials
            .create(NewStaff::new(email, TEST_PASSWORD, role, status))
            .await
            .expect("failed to create staff")
            .to_principal()
    }

    /// Assign a canonical or custom role by name
    pub async fn assign(&self, staff_id: i64, role_name: &str) {
        let role = self
            .permissions
            .find_role(role_name)
            .await
            .expect("role lookup failed")
            .expect("role not found");
        self.permissions
            .assign_role(staff_id, role.id)
            .await
            .expect("failed to assign role");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    fn driver() -> Principal {
        Principal::new(3, "driver@test.com", StaffRole::Driver, StaffStatus::Active)
    }

    #[test]
    fn test_helpers_produce_expected_failures() {
        let service = test_token_service();
        assert!(service.validate(&test_token(&driver())).is_ok());
        assert!(matches!(
            service.validate(&expired_token(&driver())),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            service.validate(&foreign_token(&driver())),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_custom_audience() {
        let token = token_with_audience(&driver(), vec!["staff:2".to_string()]);
        let claims = test_token_service().validate(&token).unwrap();
        assert_eq!(claims.level().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stores_seeded() {
        let stores = TestStores::new().await;
        let principal = stores
            .add_staff("admin@test.com", StaffRole::Admin, StaffStatus::Active)
            .await;
        stores.assign(principal.id, "Admin").await;

        let perms = stores
            .permissions
            .resolve_effective_permissions(principal.id)
            .await
            .unwrap();
        assert_eq!(perms.len(), 25);
    }
}
