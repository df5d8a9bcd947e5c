//! Wastedesk - Authorization
//!
//! Token issuance, credential checks and role-based permissions for the
//! wastedesk back office.
//!
//! # Overview
//!
//! Two independent checks protect a request:
//!
//! ## Token level
//!
//! Every token carries the holder's privilege level in its audience:
//! ```text
//! "aud": ["staff:7"]
//! ```
//! - Level derives from the staff role (see [`StaffRole::level`])
//! - Compared against a per-route minimum, no storage access
//!
//! ## Effective permissions
//!
//! Roles stored in the database grant `group:action` permissions:
//! ```text
//! staff ──< user_roles >── roles ──< role_permissions >── permissions
//! ```
//! - Resolved per request with one join, never cached
//! - Catalog and canonical roles seeded idempotently at boot
//!
//! # Usage
//!
//! ```ignore
//! use wastedesk_auth::{AuthService, SigningKeys, TokenService};
//!
//! let tokens = TokenService::new(SigningKeys::hs256(secret), "waste.mysterchat.com");
//! let service = AuthService::new(credentials, permissions, Arc::new(tokens));
//! let login = service.login("driver@example.com", "password").await?;
//! ```

mod catalog;
mod claims;
mod credential_store;
mod database;
mod error;
pub mod keys;
pub mod password;
mod permission_store;
mod service;
mod staff;
mod token;

/// Test utilities for tokens and seeded in-memory stores
pub mod test_utils;


pub use error::{AuthError, ErrorKind, Result};

// Identity
pub use staff::{NewStaff, Principal, StaffRecord, StaffRole, StaffStatus};

// Tokens
pub use claims::{AUDIENCE_PREFIX, TOKEN_TTL_SECS, TokenClaims, extract_level, level_audience};
pub use keys::{KeyPairPem, SigningKeys, generate_p256_keypair, write_p256_keypair};
pub use token::{DEFAULT_ISSUER, IssuedToken, TokenService};

// Permissions
pub use catalog::{CanonicalRole, Permission, PermissionAction, PermissionGroup, catalog};
pub use permission_store::{
    PermissionRecord, PermissionStore, RoleRecord, SeedReport, SqlitePermissionStore,
};

// Storage and orchestration
pub use credential_store::{CredentialStore, SqliteCredentialStore};
pub use database::Database;
pub use service::{AuthService, LoginResponse, bootstrap_admin};
