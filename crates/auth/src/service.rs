//! Authentication service
//!
//! Orchestrates credential checks, token issuance and password changes.
//! This is the main entry point the HTTP layer calls for login flows.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::CanonicalRole;
use crate::credential_store::CredentialStore;
use crate::error::{AuthError, Result};
use crate::password::{check_password_strength, hash_password, verify_dummy, verify_password};
use crate::permission_store::PermissionStore;
use crate::staff::{NewStaff, StaffRecord, StaffRole, StaffStatus};
use crate::token::TokenService;

/// Successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Unix timestamp
    pub expires_at: i64,
    pub staff: StaffRecord,
}

/// Credential and token operations over the configured stores
#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    permissions: Arc<dyn PermissionStore>,
    tokens: Arc<TokenService>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        permissions: Arc<dyn PermissionStore>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            credentials,
            permissions,
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn permissions(&self) -> &Arc<dyn PermissionStore> {
        &self.permissions
    }

    /// Check an email and password pair
    ///
    /// Unknown email, wrong password and a non-active account all fail with
    /// the same [`AuthError::InvalidCredentials`] so callers cannot tell
    /// which accounts exist.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<StaffRecord> {
        let Some(staff) = self.credentials.find_by_email(email).await? else {
            verify_dummy(password);
            debug!(email, "login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &staff.password_hash)? {
            debug!(staff_id = staff.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !staff.status.is_active() {
            warn!(
                staff_id = staff.id,
                status = %staff.status,
                "login rejected for non-active account"
            );
            return Err(AuthError::InvalidCredentials);
        }

        Ok(staff)
    }

    /// Authenticate and issue a token
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let staff = self.authenticate(email, password).await?;
        let issued = self.tokens.issue(&staff.to_principal())?;

        info!(staff_id = staff.id, role = %staff.role, "Staff logged in");

        Ok(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            staff,
        })
    }

    /// Replace a staff member's password after checking the current one
    pub async fn change_password(&self, staff_id: i64, old: &str, new: &str) -> Result<()> {
        let mut staff = self.current_staff(staff_id).await?;

        if !verify_password(old, &staff.password_hash)? {
            warn!(staff_id, "password change with incorrect old password");
            return Err(AuthError::IncorrectPassword);
        }
        check_password_strength(new)?;

        staff.password_hash = hash_password(new)?;
        self.credentials.save(&staff).await?;

        info!(staff_id, "password changed");
        Ok(())
    }

    /// Live staff record for an authenticated id
    pub async fn current_staff(&self, staff_id: i64) -> Result<StaffRecord> {
        self.credentials
            .find_by_id(staff_id)
            .await?
            .ok_or(AuthError::StaffNotFound(staff_id))
    }

    pub async fn effective_permissions(&self, staff_id: i64) -> Result<BTreeSet<String>> {
        self.permissions.resolve_effective_permissions(staff_id).await
    }

    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<bool> {
        bootstrap_admin(
            self.credentials.as_ref(),
            self.permissions.as_ref(),
            email,
            password,
        )
        .await
    }
}

/// Make sure an administrator account exists and holds the `Admin` role
///
/// Needs only the stores, so it runs without signing keys. Returns `true`
/// when the account was created. An existing account keeps its password.
pub async fn bootstrap_admin(
    credentials: &dyn CredentialStore,
    permissions: &dyn PermissionStore,
    email: &str,
    password: &str,
) -> Result<bool> {
    let (staff, created) = match credentials.find_by_email(email).await? {
        Some(staff) => (staff, false),
        None => {
            check_password_strength(password)?;
            let staff = credentials
                .create(NewStaff::new(
                    email,
                    password,
                    StaffRole::Admin,
                    StaffStatus::Active,
                ))
                .await?;
            (staff, true)
        }
    };

    let admin_role = CanonicalRole::Admin.name();
    let role = permissions
        .find_role(admin_role)
        .await?
        .ok_or_else(|| AuthError::RoleNotFound(admin_role.to_string()))?;
    permissions.assign_role(staff.id, role.id).await?;

    if created {
        info!(staff_id = staff.id, email, "bootstrap admin created");
    } else {
        debug!(staff_id = staff.id, "bootstrap admin already present");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::{TEST_PASSWORD, TestStores, test_token_service};

    fn service(stores: &TestStores) -> AuthService {
        AuthService::new(
            stores.credentials.clone(),
            stores.permissions.clone(),
            Arc::new(test_token_service()),
        )
    }

    #[tokio::test]
    async fn test_login_issues_valid_token() {
        let stores = TestStores::new().await;
        let principal = stores
            .add_staff("admin@system.com", StaffRole::Admin, StaffStatus::Active)
            .await;
        let service = service(&stores);

        let response = service.login("admin@system.com", TEST_PASSWORD).await.unwrap();
        assert_eq!(response.staff.id, principal.id);

        let claims = service.tokens().validate(&response.token).unwrap();
        assert_eq!(claims.staff_id, principal.id);
        assert_eq!(claims.role, StaffRole::Admin);
        assert_eq!(claims.expires_at, response.expires_at);
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let stores = TestStores::new().await;
        stores
            .add_staff("active@test.com", StaffRole::Driver, StaffStatus::Active)
            .await;
        stores
            .add_staff("away@test.com", StaffRole::Driver, StaffStatus::OnLeave)
            .await;
        let service = service(&stores);

        let unknown = service.authenticate("ghost@test.com", TEST_PASSWORD).await;
        let wrong = service.authenticate("active@test.com", "not-the-password").await;
        let inactive = service.authenticate("away@test.com", TEST_PASSWORD).await;

        for result in [unknown, wrong, inactive] {
            let err = result.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
            assert_eq!(err.kind(), ErrorKind::Unauthenticated);
            assert_eq!(err.to_string(), "invalid email or password");
        }
    }

    #[tokio::test]
    async fn test_unknown_email_pays_for_verification() {
        let stores = TestStores::new().await;
        stores
            .add_staff("known@test.com", StaffRole::Driver, StaffStatus::Active)
            .await;
        let service = service(&stores);
        // First miss also computes the throwaway hash
        let _ = service.authenticate("warmup@test.com", TEST_PASSWORD).await;

        let started = Instant::now();
        let wrong = service.authenticate("known@test.com", "not-the-password").await;
        let wrong_elapsed = started.elapsed();

        let started = Instant::now();
        let unknown = service.authenticate("ghost@test.com", "not-the-password").await;
        let unknown_elapsed = started.elapsed();

        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(
            unknown_elapsed * 4 >= wrong_elapsed,
            "unknown {:?} vs wrong {:?}",
            unknown_elapsed,
            wrong_elapsed
        );
    }

    #[tokio::test]
    async fn test_change_password() {
        let stores = TestStores::new().await;
        let principal = stores
            .add_staff("pw@test.com", StaffRole::Collector, StaffStatus::Active)
            .await;
        let service = service(&stores);

        service
            .change_password(principal.id, TEST_PASSWORD, "a-much-longer-one")
            .await
            .unwrap();

        assert!(service.authenticate("pw@test.com", TEST_PASSWORD).await.is_err());
        assert!(
            service
                .authenticate("pw@test.com", "a-much-longer-one")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_change_password_rejections() {
        let stores = TestStores::new().await;
        let principal = stores
            .add_staff("pw2@test.com", StaffRole::Collector, StaffStatus::Active)
            .await;
        let service = service(&stores);

        let err = service
            .change_password(principal.id, "wrong-old-password", "long-enough-pass")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);

        let err = service
            .change_password(principal.id, TEST_PASSWORD, "short")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword { min: 8 }));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = service
            .change_password(9_999, TEST_PASSWORD, "long-enough-pass")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_idempotent() {
        let stores = TestStores::new().await;
        let service = service(&stores);

        assert!(service.bootstrap_admin("root@test.com", "root-password").await.unwrap());
        assert!(!service.bootstrap_admin("root@test.com", "other-password").await.unwrap());

        let staff = service.authenticate("root@test.com", "root-password").await.unwrap();
        assert_eq!(staff.role, StaffRole::Admin);

        let permissions = service.effective_permissions(staff.id).await.unwrap();
        assert_eq!(permissions.len(), 25);
    }

    #[tokio::test]
    async fn test_current_staff_tombstoned() {
        let stores = TestStores::new().await;
        let principal = stores
            .add_staff("gone@test.com", StaffRole::Driver, StaffStatus::Active)
            .await;
        stores.credentials.soft_delete(principal.id).await.unwrap();

        let err = service(&stores).current_staff(principal.id).await.unwrap_err();
        assert!(matches!(err, AuthError::StaffNotFound(_)));
    }
}
