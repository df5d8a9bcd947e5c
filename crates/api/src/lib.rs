//! Wastedesk API
//!
//! HTTP surface and authorization guards for the wastedesk back office.
//!
//! # Usage
//!
//! ```ignore
//! use wastedesk_api::{AppState, GuardSettings, build_router};
//!
//! let state = AppState::new(auth_service, GuardSettings::default());
//! let app = build_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/v1/auth/login` - Email and password login
//! - `GET /api/v1/auth/me` - Caller's staff record
//! - `PUT /api/v1/auth/change-password` - Change own password
//! - `GET /api/v1/auth/level` - Token level and subject
//! - `GET /api/v1/auth/socket` - Socket-protocol token check
//!
//! ## Staff
//! - `GET /api/v1/staff` - List staff (admin, route manager)
//! - `GET /api/v1/staff/{id}` - Staff record (owner or admin)
//! - `GET /api/v1/staff/{id}/avatar` - Staff summary, accepts `?token=`
//!
//! ## Access
//! - `GET /api/v1/access/me/permissions` - Caller's effective permissions
//! - `/api/v1/access/{permissions,roles,users}` - Role and grant management

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
pub mod types;

// Re-exports
pub use auth::{
    ActiveStaffGuard, Authenticated, BearerGuard, CurrentStaff, EffectivePermissions, Guard,
    GuardChain, OwnerOrRoleGuard, PermissionGuard, RoleGuard, TokenSource,
};
pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::{AppState, GuardSettings};
