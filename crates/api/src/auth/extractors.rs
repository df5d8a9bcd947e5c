//! Handler extractors for identity established by guards
//!
//! These never validate anything themselves: they read what a guard
//! already attached to the request. A handler mounted without the matching
//! guard gets a 401.

use std::collections::BTreeSet;
use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use wastedesk_auth::{Principal, TokenClaims};

use crate::error::ApiError;

/// Validated token attached by the bearer guard
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub claims: TokenClaims,
    /// Raw token as presented
    pub token: String,
    /// Level taken from the audience
    pub level: i64,
}

/// Active principal attached by the status guard or the permission guard
#[derive(Debug, Clone)]
pub struct CurrentStaff(pub Principal);

impl Deref for CurrentStaff {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Permissions resolved by the permission guard for this request
#[derive(Debug, Clone, Default)]
pub struct EffectivePermissions(pub BTreeSet<String>);

fn missing_identity() -> ApiError {
    ApiError::unauthorized("authentication required")
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authenticated>()
            .cloned()
            .ok_or_else(missing_identity)
    }
}

impl<S> FromRequestParts<S> for CurrentStaff
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentStaff)
            .ok_or_else(missing_identity)
    }
}

impl<S> FromRequestParts<S> for EffectivePermissions
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<EffectivePermissions>()
            .cloned()
            .ok_or_else(missing_identity)
    }
}
