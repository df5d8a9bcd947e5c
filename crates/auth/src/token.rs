//! Token issuance and validation

use chrono::{DateTime, Utc};
use jsonwebtoken::{Header, Validation, decode, encode};
use serde::Serialize;
use tracing::debug;

use crate::claims::TokenClaims;
use crate::error::{AuthError, Result};
use crate::keys::SigningKeys;
use crate::staff::Principal;

/// Default `iss` claim
pub const DEFAULT_ISSUER: &str = "waste.mysterchat.com";

/// A freshly signed token
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    /// Expiration as a Unix timestamp
    pub expires_at: i64,
}

/// Mints and verifies access tokens
///
/// Stateless: no session store, no revocation list. Every token lives for
/// exactly 24 hours from issuance.
pub struct TokenService {
    keys: SigningKeys,
    validation: Validation,
    issuer: String,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.keys.algorithm())
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenService {
    /// Create a service issuing tokens as `issuer`
    pub fn new(keys: SigningKeys, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(keys.algorithm());
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Audience carries the level and is interpreted by the guards
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.set_issuer(&[&issuer]);

        Self {
            keys,
            validation,
            issuer,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token for a principal, valid from now for 24 hours
    pub fn issue(&self, principal: &Principal) -> Result<IssuedToken> {
        self.issue_at(principal, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<IssuedToken> {
        let claims = TokenClaims::for_principal(principal, &self.issuer, now.timestamp());
        let token = self.sign(&claims)?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at,
        })
    }

    /// Sign arbitrary claims with the configured key
    pub fn sign(&self, claims: &TokenClaims) -> Result<String> {
        encode(
            &Header::new(self.keys.algorithm()),
            claims,
            self.keys.encoding_key(),
        )
        .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature, issuer and time window, then decode the claims
    ///
    /// Every failure maps to an unauthenticated error kind.
    pub fn validate(&self, token: &str) -> Result<TokenClaims> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<TokenClaims>(token, self.keys.decoding_key(), &self.validation)
            .map_err(|e| {
                debug!(error = %e, "token validation failed");
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                    ErrorKind::InvalidSignature
                    | ErrorKind::InvalidAlgorithm
                    | ErrorKind::InvalidEcdsaKey => AuthError::InvalidSignature,
                    ErrorKind::InvalidToken
                    | ErrorKind::Base64(_)
                    | ErrorKind::Json(_)
                    | ErrorKind::Utf8(_) => AuthError::InvalidTokenFormat,
                    _ => AuthError::InvalidClaims(e.to_string()),
                }
            })?;

        Ok(data.claims)
    }
}
