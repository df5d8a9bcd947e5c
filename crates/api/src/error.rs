//! API error types
//!
//! Every failure is rendered as the same envelope:
//!
//! ```json
//! { "success": false,
//!   "errors": [ { "code": 401, "title": "Unauthorized", "message": "..." } ] }
//! ```

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use wastedesk_auth::{AuthError, ErrorKind};

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Internal server error; the message is safe to show to clients
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code, used in logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Human-readable status title
    pub fn title(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "Bad Request",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound(_) => "Not Found",
            Self::Internal(_) => "Internal Server Error",
        }
    }

    // Helper constructors

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{} '{}' not found", entity, id))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e.kind() {
            ErrorKind::Unauthenticated => Self::Unauthorized(e.to_string()),
            ErrorKind::Forbidden => Self::Forbidden(e.to_string()),
            ErrorKind::InvalidRequest => Self::BadRequest(e.to_string()),
            ErrorKind::NotFound => Self::NotFound(e.to_string()),
            ErrorKind::Internal => {
                // Details stay in the log, never in the response
                error!(error = %e, "internal error");
                Self::Internal("internal server error".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// One entry of the error envelope
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// HTTP status code
    pub code: u16,
    pub title: &'static str,
    pub message: String,
}

/// Error response envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub errors: Vec<ErrorBody>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            success: false,
            errors: vec![ErrorBody {
                code: status.as_u16(),
                title: self.title(),
                message: self.to_string(),
            }],
        };

        tracing::warn!(
            error_code = self.code(),
            error_message = %body.errors[0].message,
            status = %status,
            "API error"
        );

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_mapping() {
        let cases = [
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::AccountInactive, StatusCode::FORBIDDEN),
            (AuthError::MalformedAudience, StatusCode::BAD_REQUEST),
            (AuthError::WeakPassword { min: 8 }, StatusCode::BAD_REQUEST),
            (AuthError::StaffNotFound(3), StatusCode::NOT_FOUND),
            (
                AuthError::DatabaseError("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = ApiError::from(AuthError::DatabaseError("secret dsn".to_string()));
        assert_eq!(err.to_string(), "internal server error");
    }

    #[test]
    fn test_message_preserved() {
        let err = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "invalid email or password");
        assert_eq!(err.title(), "Unauthorized");
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let response = ApiError::forbidden("account is not active").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["code"], 403);
        assert_eq!(json["errors"][0]["title"], "Forbidden");
        assert_eq!(json["errors"][0]["message"], "account is not active");
    }
}
