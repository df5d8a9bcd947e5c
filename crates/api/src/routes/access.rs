//! Access control routes
//!
//! Role and permission management, guarded by stored permissions.
//!
//! | Route | Requires |
//! |-------|----------|
//! | `GET /me/permissions` | active staff |
//! | `GET /permissions` | `permission:list` |
//! | `GET /roles` | `role:list` |
//! | `POST /roles` | `role:create` |
//! | `GET /roles/{id}` | `role:read` |
//! | `PUT /roles/{id}` | `role:update` |
//! | `DELETE /roles/{id}` | `role:delete` |
//! | `GET /roles/{id}/permissions` | `role_permission:list` |
//! | `POST /roles/{id}/permissions` | `role_permission:create` |
//! | `DELETE /roles/{id}/permissions/{permission}` | `role_permission:delete` |
//! | `GET /users/{id}/roles` | `user_role:list` |
//! | `POST /users/{id}/roles` | `user_role:create` |
//! | `DELETE /users/{id}/roles/{role_id}` | `user_role:delete` |

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    handler::Handler,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use wastedesk_auth::{
    AuthError, Permission, PermissionAction as Action, PermissionGroup as Group,
    PermissionRecord, RoleRecord,
};

use crate::auth::CurrentStaff;
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::ApiResponse;

const PERMISSION_LIST: Permission = Permission::new(Group::Permission, Action::List);
const ROLE_LIST: Permission = Permission::new(Group::Role, Action::List);
const ROLE_CREATE: Permission = Permission::new(Group::Role, Action::Create);
const ROLE_READ: Permission = Permission::new(Group::Role, Action::Read);
const ROLE_UPDATE: Permission = Permission::new(Group::Role, Action::Update);
const ROLE_DELETE: Permission = Permission::new(Group::Role, Action::Delete);
const ROLE_PERMISSION_LIST: Permission = Permission::new(Group::RolePermission, Action::List);
const ROLE_PERMISSION_CREATE: Permission = Permission::new(Group::RolePermission, Action::Create);
const ROLE_PERMISSION_DELETE: Permission = Permission::new(Group::RolePermission, Action::Delete);
const USER_ROLE_LIST: Permission = Permission::new(Group::UserRole, Action::List);
const USER_ROLE_CREATE: Permission = Permission::new(Group::UserRole, Action::Create);
const USER_ROLE_DELETE: Permission = Permission::new(Group::UserRole, Action::Delete);

/// Access control routes
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/me/permissions",
            get(my_permissions.layer(state.active_staff())),
        )
        .route(
            "/permissions",
            get(list_permissions.layer(state.require_permissions([PERMISSION_LIST]))),
        )
        .route(
            "/roles",
            get(list_roles.layer(state.require_permissions([ROLE_LIST])))
                .post(create_role.layer(state.require_permissions([ROLE_CREATE]))),
        )
        .route(
            "/roles/{id}",
            get(get_role.layer(state.require_permissions([ROLE_READ])))
                .put(rename_role.layer(state.require_permissions([ROLE_UPDATE])))
                .delete(delete_role.layer(state.require_permissions([ROLE_DELETE]))),
        )
        .route(
            "/roles/{id}/permissions",
            get(list_role_permissions.layer(state.require_permissions([ROLE_PERMISSION_LIST])))
                .post(
                    grant_permission.layer(state.require_permissions([ROLE_PERMISSION_CREATE])),
                ),
        )
        .route(
            "/roles/{id}/permissions/{permission}",
            delete(revoke_permission.layer(state.require_permissions([ROLE_PERMISSION_DELETE]))),
        )
        .route(
            "/users/{id}/roles",
            get(list_user_roles.layer(state.require_permissions([USER_ROLE_LIST])))
                .post(assign_role.layer(state.require_permissions([USER_ROLE_CREATE]))),
        )
        .route(
            "/users/{id}/roles/{role_id}",
            delete(unassign_role.layer(state.require_permissions([USER_ROLE_DELETE]))),
        )
}

#[derive(Debug, Serialize)]
pub struct MyPermissionsResponse {
    pub staff_id: i64,
    pub permissions: Vec<String>,
}

/// Body of role create and rename
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    #[serde(default)]
    pub permission: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: i64,
}

/// Whether a grant or assignment changed anything
#[derive(Debug, Serialize)]
pub struct ChangeResponse {
    pub changed: bool,
}

fn parse_permission(raw: &str) -> Result<Permission> {
    Permission::parse(raw).ok_or_else(|| ApiError::bad_request(format!("unknown permission '{}'", raw)))
}

/// GET /api/v1/access/me/permissions
async fn my_permissions(
    State(state): State<AppState>,
    staff: CurrentStaff,
) -> Result<Json<ApiResponse<MyPermissionsResponse>>> {
    let permissions = state.auth.effective_permissions(staff.id).await?;
    Ok(Json(ApiResponse::new(MyPermissionsResponse {
        staff_id: staff.id,
        permissions: permissions.into_iter().collect(),
    })))
}

/// GET /api/v1/access/permissions
async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PermissionRecord>>>> {
    let permissions = state.permissions().list_permissions().await?;
    Ok(Json(ApiResponse::new(permissions)))
}

/// GET /api/v1/access/roles
async fn list_roles(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<RoleRecord>>>> {
    let roles = state.permissions().list_roles().await?;
    Ok(Json(ApiResponse::new(roles)))
}

/// POST /api/v1/access/roles
async fn create_role(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RoleRecord>>> {
    let Json(req) = payload?;
    let role = state.permissions().create_role(&req.name).await?;
    Ok(Json(ApiResponse::new(role)))
}

/// GET /api/v1/access/roles/{id}
async fn get_role(
    State(state): State<AppState>,
    role_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<RoleRecord>>> {
    let Path(role_id) = role_id?;
    let role = state.permissions().get_role(role_id).await?;
    Ok(Json(ApiResponse::new(role)))
}

/// PUT /api/v1/access/roles/{id}
async fn rename_role(
    State(state): State<AppState>,
    role_id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RoleRecord>>> {
    let Path(role_id) = role_id?;
    let Json(req) = payload?;
    let role = state.permissions().rename_role(role_id, &req.name).await?;
    Ok(Json(ApiResponse::new(role)))
}

/// DELETE /api/v1/access/roles/{id}
async fn delete_role(
    State(state): State<AppState>,
    role_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<ChangeResponse>>> {
    let Path(role_id) = role_id?;
    if !state.permissions().delete_role(role_id).await? {
        return Err(AuthError::RoleNotFound(role_id.to_string()).into());
    }
    Ok(Json(ApiResponse::new(ChangeResponse { changed: true })))
}

/// GET /api/v1/access/roles/{id}/permissions
async fn list_role_permissions(
    State(state): State<AppState>,
    role_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<Vec<String>>>> {
    let Path(role_id) = role_id?;
    let permissions = state.permissions().list_role_permissions(role_id).await?;
    Ok(Json(ApiResponse::new(permissions)))
}

/// POST /api/v1/access/roles/{id}/permissions
async fn grant_permission(
    State(state): State<AppState>,
    role_id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<GrantRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ChangeResponse>>> {
    let Path(role_id) = role_id?;
    let Json(req) = payload?;
    let permission = parse_permission(&req.permission)?;

    let changed = state
        .permissions()
        .grant_permission(role_id, permission)
        .await?;
    Ok(Json(ApiResponse::new(ChangeResponse { changed })))
}

/// DELETE /api/v1/access/roles/{id}/permissions/{permission}
async fn revoke_permission(
    State(state): State<AppState>,
    path: std::result::Result<Path<(i64, String)>, PathRejection>,
) -> Result<Json<ApiResponse<ChangeResponse>>> {
    let Path((role_id, raw)) = path?;
    let permission = parse_permission(&raw)?;

    let changed = state
        .permissions()
        .revoke_permission(role_id, permission)
        .await?;
    Ok(Json(ApiResponse::new(ChangeResponse { changed })))
}

/// GET /api/v1/access/users/{id}/roles
async fn list_user_roles(
    State(state): State<AppState>,
    staff_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<Vec<RoleRecord>>>> {
    let Path(staff_id) = staff_id?;
    let roles = state.permissions().list_user_roles(staff_id).await?;
    Ok(Json(ApiResponse::new(roles)))
}

/// POST /api/v1/access/users/{id}/roles
async fn assign_role(
    State(state): State<AppState>,
    staff_id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<AssignRoleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ChangeResponse>>> {
    let Path(staff_id) = staff_id?;
    let Json(req) = payload?;

    let changed = state
        .permissions()
        .assign_role(staff_id, req.role_id)
        .await?;
    Ok(Json(ApiResponse::new(ChangeResponse { changed })))
}

/// DELETE /api/v1/access/users/{id}/roles/{role_id}
async fn unassign_role(
    State(state): State<AppState>,
    path: std::result::Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Json<ApiResponse<ChangeResponse>>> {
    let Path((staff_id, role_id)) = path?;

    let changed = state
        .permissions()
        .unassign_role(staff_id, role_id)
        .await?;
    Ok(Json(ApiResponse::new(ChangeResponse { changed })))
}
