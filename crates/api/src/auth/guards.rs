//! Concrete guards
//!
//! Every guard follows the same stages: extract, validate, check status,
//! attach. They differ in where the token comes from and in what they
//! compare against.
//!
//! | Guard | Requires | Attaches |
//! |-------|----------|----------|
//! | [`BearerGuard`] | token at or above a level | [`Authenticated`] |
//! | [`ActiveStaffGuard`] | [`Authenticated`], status `active` | [`Principal`] |
//! | [`RoleGuard`] | [`Principal`] with an allowed role | - |
//! | [`OwnerOrRoleGuard`] | [`Principal`] owning the path id, or an allowed role | - |
//! | [`PermissionGuard`] | token whose holder has every required permission | [`Principal`], [`EffectivePermissions`] |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, OriginalUri, RawPathParams};
use axum::http::request::Parts;
use tracing::{debug, warn};

use wastedesk_auth::{
    AuthError, Permission, PermissionStore, Principal, StaffRole, TokenService,
};

use super::extract::{TokenSource, extract_token};
use super::extractors::{Authenticated, EffectivePermissions};
use super::guard::Guard;
use crate::error::ApiError;

fn missing_identity() -> ApiError {
    ApiError::unauthorized("authentication required")
}

/// Full request path, including any prefix stripped by nesting
fn request_path(parts: &Parts) -> String {
    parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}

/// Validates the token and enforces a minimum level
pub struct BearerGuard {
    tokens: Arc<TokenService>,
    source: TokenSource,
    min_level: Option<u8>,
}

impl BearerGuard {
    pub fn new(tokens: Arc<TokenService>, source: TokenSource, min_level: u8) -> Self {
        Self {
            tokens,
            source,
            min_level: Some(min_level),
        }
    }

    /// Validation only; every level passes
    pub fn any_level(tokens: Arc<TokenService>, source: TokenSource) -> Self {
        Self {
            tokens,
            source,
            min_level: None,
        }
    }
}

#[async_trait]
impl Guard for BearerGuard {
    async fn check(&self, parts: &mut Parts) -> Result<(), ApiError> {
        let token = extract_token(parts, self.source)?;

        let claims = self.tokens.validate(&token).map_err(|e| {
            debug!(error = %e, path = %request_path(parts), "token rejected");
            ApiError::from(e)
        })?;

        let level = claims.level()?;
        if let Some(min_level) = self.min_level.filter(|&min| level < i64::from(min)) {
            debug!(
                staff_id = claims.staff_id,
                level,
                required = min_level,
                "token level too low"
            );
            return Err(ApiError::forbidden(format!(
                "{} need permission level {}",
                request_path(parts),
                min_level
            )));
        }

        parts.extensions.insert(Authenticated {
            claims,
            token,
            level,
        });
        Ok(())
    }
}

/// Rejects principals whose status is not `active`
///
/// Runs after [`BearerGuard`].
pub struct ActiveStaffGuard;

#[async_trait]
impl Guard for ActiveStaffGuard {
    async fn check(&self, parts: &mut Parts) -> Result<(), ApiError> {
        let principal = {
            let auth = parts
                .extensions
                .get::<Authenticated>()
                .ok_or_else(missing_identity)?;
            auth.claims.principal()
        };

        if !principal.status.is_active() {
            debug!(staff_id = principal.id, status = %principal.status, "inactive staff rejected");
            return Err(AuthError::AccountInactive.into());
        }

        parts.extensions.insert(principal);
        Ok(())
    }
}

/// Allows only principals holding one of the listed roles
pub struct RoleGuard {
    allowed: Vec<StaffRole>,
}

impl RoleGuard {
    pub fn new(allowed: impl IntoIterator<Item = StaffRole>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Guard for RoleGuard {
    async fn check(&self, parts: &mut Parts) -> Result<(), ApiError> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .ok_or_else(missing_identity)?;

        if principal.has_any_role(&self.allowed) {
            return Ok(());
        }
        Err(ApiError::forbidden(format!(
            "role {} cannot access {}",
            principal.role,
            request_path(parts)
        )))
    }
}

/// Allows the principal named by a path parameter, or any listed role
pub struct OwnerOrRoleGuard {
    allowed: Vec<StaffRole>,
    param: &'static str,
}

impl OwnerOrRoleGuard {
    /// Owner is identified by the `id` path parameter
    pub fn new(allowed: impl IntoIterator<Item = StaffRole>) -> Self {
        Self::with_param(allowed, "id")
    }

    pub fn with_param(allowed: impl IntoIterator<Item = StaffRole>, param: &'static str) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            param,
        }
    }
}

#[async_trait]
impl Guard for OwnerOrRoleGuard {
    async fn check(&self, parts: &mut Parts) -> Result<(), ApiError> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(missing_identity)?;

        if principal.has_any_role(&self.allowed) {
            return Ok(());
        }

        let params = RawPathParams::from_request_parts(parts, &())
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        let raw = params
            .iter()
            .find(|(key, _)| *key == self.param)
            .map(|(_, value)| value.to_string())
            .ok_or_else(|| {
                ApiError::bad_request(format!("missing path parameter '{}'", self.param))
            })?;

        match raw.parse::<i64>() {
            Ok(id) if id == principal.id => Ok(()),
            Ok(_) => Err(ApiError::forbidden(
                "only the owner or an authorized role may access this resource",
            )),
            Err(_) => Err(ApiError::bad_request(format!(
                "invalid {} '{}'",
                self.param, raw
            ))),
        }
    }
}

/// Requires every listed permission in the holder's effective set
///
/// Standalone: does its own extraction (header, then query) and
/// validation. The permission set is resolved from storage on every
/// request under `timeout`.
pub struct PermissionGuard {
    tokens: Arc<TokenService>,
    store: Arc<dyn PermissionStore>,
    required: Vec<Permission>,
    timeout: Duration,
}

impl PermissionGuard {
    pub fn new(
        tokens: Arc<TokenService>,
        store: Arc<dyn PermissionStore>,
        required: impl IntoIterator<Item = Permission>,
        timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            store,
            required: required.into_iter().collect(),
            timeout,
        }
    }

    fn required_list(&self) -> String {
        self.required
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[async_trait]
impl Guard for PermissionGuard {
    async fn check(&self, parts: &mut Parts) -> Result<(), ApiError> {
        let token = extract_token(parts, TokenSource::HeaderOrQuery)?;

        let claims = self.tokens.validate(&token).map_err(|e| {
            debug!(error = %e, path = %request_path(parts), "token rejected");
            ApiError::unauthorized(e.to_string())
        })?;
        let staff_id = claims
            .subject_id()
            .map_err(|e| ApiError::unauthorized(e.to_string()))?;

        if !claims.status.is_active() {
            debug!(staff_id, status = %claims.status, "inactive staff rejected");
            return Err(AuthError::AccountInactive.into());
        }

        let lookup = self.store.resolve_effective_permissions(staff_id);
        let granted = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(staff_id, timeout = ?self.timeout, "permission lookup timed out");
                return Err(AuthError::LookupTimeout(self.timeout).into());
            }
        };

        let missing: Vec<String> = self
            .required
            .iter()
            .map(ToString::to_string)
            .filter(|p| !granted.contains(p))
            .collect();
        if !missing.is_empty() {
            debug!(staff_id, ?missing, "permission denied");
            return Err(ApiError::forbidden(format!(
                "need permission(s): [{}]",
                self.required_list()
            )));
        }

        parts.extensions.insert(Principal::new(
            staff_id,
            claims.email.clone(),
            claims.role,
            claims.status,
        ));
        parts.extensions.insert(EffectivePermissions(granted));
        Ok(())
    }
}
