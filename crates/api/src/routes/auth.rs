//! Authentication routes
//!
//! Endpoints for login, the caller's own record and password changes.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    handler::Handler,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use wastedesk_auth::{LoginResponse, Principal, StaffRecord, StaffRole};

use crate::auth::{Authenticated, CurrentStaff};
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{ApiResponse, MessageResponse};

/// Auth routes
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me.layer(state.active_staff())))
        .route(
            "/change-password",
            put(change_password.layer(state.active_staff())),
        )
        .route("/level", get(level.layer(state.bearer())))
        .route("/socket", get(socket.layer(state.socket_staff())))
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Password change request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Token level as seen by the bearer guard
#[derive(Debug, Serialize)]
pub struct LevelResponse {
    pub subject: String,
    pub staff_id: i64,
    pub role: StaffRole,
    pub level: i64,
    pub expires_at: i64,
}

/// Login endpoint
///
/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let Json(req) = payload?;

    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let response = state.auth.login(email, &req.password).await?;
    Ok(Json(ApiResponse::new(response)))
}

/// Caller's own staff record
///
/// GET /api/v1/auth/me
async fn me(
    State(state): State<AppState>,
    staff: CurrentStaff,
) -> Result<Json<ApiResponse<StaffRecord>>> {
    let record = state.auth.current_staff(staff.id).await?;
    Ok(Json(ApiResponse::new(record)))
}

/// Change the caller's password
///
/// PUT /api/v1/auth/change-password
async fn change_password(
    State(state): State<AppState>,
    staff: CurrentStaff,
    payload: std::result::Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>> {
    let Json(req) = payload?;

    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::bad_request(
            "old_password and new_password are required",
        ));
    }

    state
        .auth
        .change_password(staff.id, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(ApiResponse::new(MessageResponse::new(
        "password changed",
    ))))
}

/// GET /api/v1/auth/level
async fn level(auth: Authenticated) -> Json<ApiResponse<LevelResponse>> {
    Json(ApiResponse::new(LevelResponse {
        subject: auth.claims.subject,
        staff_id: auth.claims.staff_id,
        role: auth.claims.role,
        level: auth.level,
        expires_at: auth.claims.expires_at,
    }))
}

/// Principal behind a socket upgrade token
///
/// GET /api/v1/auth/socket
async fn socket(staff: CurrentStaff) -> Json<ApiResponse<Principal>> {
    Json(ApiResponse::new(staff.0))
}
