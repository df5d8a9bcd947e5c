//! API routes
//!
//! Domain-grouped HTTP route handlers.

pub mod access;
pub mod auth;
pub mod ops;
pub mod staff;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Operations routes (health - no auth)
        .merge(ops::routes())
        // Auth routes (login, me, password)
        .nest("/api/v1/auth", auth::routes(&state))
        // Staff records (owner-or-role, role-set)
        .nest("/api/v1/staff", staff::routes(&state))
        // Roles and permissions (stored permissions)
        .nest("/api/v1/access", access::routes(&state))
        .with_state(state)
}
