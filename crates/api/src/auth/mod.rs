//! Authentication and authorization guards
//!
//! # Guards
//!
//! - `BearerGuard` - valid token at or above a level
//! - `ActiveStaffGuard` - token holder's status is `active`
//! - `RoleGuard` - principal holds an allowed role
//! - `OwnerOrRoleGuard` - principal owns the `{id}` path segment, or holds an allowed role
//! - `PermissionGuard` - holder's effective permissions cover the requirement
//!
//! # Usage
//!
//! Chains are built from [`AppState`](crate::state::AppState) factories and
//! attached per handler:
//!
//! ```ignore
//! use axum::handler::Handler;
//! use wastedesk_api::auth::RoleGuard;
//! use wastedesk_auth::StaffRole;
//!
//! // Any active staff member
//! get(me.layer(state.active_staff()))
//!
//! // Admins and route managers only
//! get(list_staff.layer(state.active_staff().then(RoleGuard::new([
//!     StaffRole::Admin,
//!     StaffRole::RouteManager,
//! ]))))
//!
//! // Stored role permissions
//! post(create_role.layer(state.require_permissions([ROLE_CREATE])))
//! ```

pub mod extract;
pub mod extractors;
pub mod guard;
pub mod guards;

pub use extract::{ExtractError, MAX_TOKEN_SIZE, TokenSource, extract_token, parse_bearer};
pub use extractors::{Authenticated, CurrentStaff, EffectivePermissions};
pub use guard::{Guard, GuardChain, GuardService};
pub use guards::{ActiveStaffGuard, BearerGuard, OwnerOrRoleGuard, PermissionGuard, RoleGuard};
