//! Staff routes
//!
//! Owner-or-role and role-set guarded reads of staff records.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::PathRejection},
    handler::Handler,
    routing::get,
};
use serde::Serialize;

use wastedesk_auth::{StaffRecord, StaffRole};

use crate::auth::{OwnerOrRoleGuard, RoleGuard};
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::ApiResponse;

/// Staff routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let owner_or_admin = state
        .active_staff()
        .then(OwnerOrRoleGuard::new([StaffRole::Admin]));
    let owner_or_manager = state
        .active_staff_or_query()
        .then(OwnerOrRoleGuard::new([StaffRole::Admin, StaffRole::RouteManager]));
    let managers = state
        .active_staff()
        .then(RoleGuard::new([StaffRole::Admin, StaffRole::RouteManager]));

    Router::new()
        .route("/", get(list_staff.layer(managers)))
        .route("/{id}", get(get_staff.layer(owner_or_admin)))
        .route("/{id}/avatar", get(get_avatar.layer(owner_or_manager)))
}

/// Public-facing subset of a staff record
#[derive(Debug, Serialize)]
pub struct StaffSummary {
    pub id: i64,
    pub prefix: String,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    pub role: StaffRole,
}

impl From<StaffRecord> for StaffSummary {
    fn from(staff: StaffRecord) -> Self {
        Self {
            id: staff.id,
            prefix: staff.prefix,
            first_name: staff.first_name,
            last_name: staff.last_name,
            role: staff.role,
        }
    }
}

async fn find_staff(state: &AppState, id: i64) -> Result<StaffRecord> {
    state
        .credentials()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("staff", &id.to_string()))
}

/// GET /api/v1/staff
async fn list_staff(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<StaffRecord>>>> {
    let staff = state.credentials().list().await?;
    Ok(Json(ApiResponse::new(staff)))
}

/// GET /api/v1/staff/{id}
async fn get_staff(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<StaffRecord>>> {
    let Path(id) = id?;
    let staff = find_staff(&state, id).await?;
    Ok(Json(ApiResponse::new(staff)))
}

/// Summary served alongside the avatar image
///
/// GET /api/v1/staff/{id}/avatar
///
/// Accepts `?token=` so image tags can authenticate.
async fn get_avatar(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<StaffSummary>>> {
    let Path(id) = id?;
    let staff = find_staff(&state, id).await?;
    Ok(Json(ApiResponse::new(staff.into())))
}
