//! Integration tests for auth endpoints
//!
//! Tests: login, bearer extraction, token validation, status checks,
//! password change, level and socket tokens

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::json;

use common::{TestApp, error_message, get, get_with_auth_header, json_request};
use wastedesk_api::GuardSettings;
use wastedesk_auth::test_utils::{
    TEST_PASSWORD, expired_token, foreign_token, token_with_audience,
};
use wastedesk_auth::{CredentialStore, StaffRole, StaffStatus};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_needs_no_auth() {
    let app = TestApp::new().await;
    let (status, body) = app.send(get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new().await;
    let (principal, _) = app
        .staff("admin@system.com", StaffRole::Admin, StaffStatus::Active)
        .await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            json!({"email": "admin@system.com", "password": TEST_PASSWORD}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["staff"]["id"], principal.id);
    assert_eq!(body["data"]["staff"]["role"], "admin");
    assert!(body["data"]["staff"].get("password_hash").is_none());

    // The issued token works on a guarded route
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let (status, body) = app.send(get("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "admin@system.com");
}

#[tokio::test]
async fn test_login_failures_share_message() {
    let app = TestApp::new().await;
    app.staff("driver@test.com", StaffRole::Driver, StaffStatus::Active)
        .await;
    app.staff("inactive@test.com", StaffRole::Driver, StaffStatus::Inactive)
        .await;

    for (email, password) in [
        ("driver@test.com", "wrong-password"),
        ("nobody@test.com", TEST_PASSWORD),
        ("inactive@test.com", TEST_PASSWORD),
    ] {
        let (status, body) = app
            .send(json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                json!({"email": email, "password": password}),
            ))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", email);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["code"], 401);
        assert_eq!(body["errors"][0]["title"], "Unauthorized");
        assert_eq!(error_message(&body), "invalid email or password");
    }
}

#[tokio::test]
async fn test_login_requires_fields() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            json!({"email": "someone@test.com"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "email and password are required");
}

#[tokio::test]
async fn test_login_malformed_json() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// =============================================================================
// Bearer extraction and validation
// =============================================================================

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new().await;
    let (status, body) = app.send(get("/api/v1/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errors"][0]["code"], 401);
}

#[tokio::test]
async fn test_malformed_authorization_headers() {
    let app = TestApp::new().await;
    let (_, token) = app
        .staff("driver@test.com", StaffRole::Driver, StaffStatus::Active)
        .await;

    for value in [
        "Bearer ".to_string(),
        "Basic abcdef".to_string(),
        format!("bearer {}", token),
        format!("Bearer {} extra", token),
        token.clone(),
    ] {
        let (status, _) = app
            .send(get_with_auth_header("/api/v1/auth/me", &value))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", value);
    }
}

#[tokio::test]
async fn test_invalid_tokens_rejected() {
    let app = TestApp::new().await;
    let (principal, _) = app
        .staff("driver@test.com", StaffRole::Driver, StaffStatus::Active)
        .await;

    for token in [
        expired_token(&principal),
        foreign_token(&principal),
        "not-a-jwt".to_string(),
    ] {
        let (status, _) = app.send(get("/api/v1/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_audience_errors() {
    let app = TestApp::new().await;
    let (principal, _) = app
        .staff("driver@test.com", StaffRole::Driver, StaffStatus::Active)
        .await;

    // No colon
    let token = token_with_audience(&principal, vec!["staff".to_string()]);
    let (status, _) = app.send(get("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing audience
    let token = token_with_audience(&principal, vec![]);
    let (status, _) = app.send(get("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Non-integer level
    let token = token_with_audience(&principal, vec!["staff:high".to_string()]);
    let (status, _) = app.send(get("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_level_below_minimum() {
    let app = TestApp::new().await;
    let (_, token) = app
        .staff("citizen@test.com", StaffRole::Citizen, StaffStatus::Active)
        .await;

    let (status, body) = app.send(get("/api/v1/auth/level", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        error_message(&body),
        "/api/v1/auth/level need permission level 4"
    );
}

#[tokio::test]
async fn test_citizen_self_access() {
    let app = TestApp::new().await;
    let (principal, token) = app
        .staff("citizen@test.com", StaffRole::Citizen, StaffStatus::Active)
        .await;

    let (status, body) = app.send(get("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "citizen@test.com");

    let own = format!("/api/v1/staff/{}", principal.id);
    let (status, _) = app.send(get(&own, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(json_request(
            Method::PUT,
            "/api/v1/auth/change-password",
            Some(&token),
            json!({"old_password": TEST_PASSWORD, "new_password": "citizen-password"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Status chains skip the floor, the level endpoint keeps it
    let (status, _) = app.send(get("/api/v1/auth/level", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_configured_minimum_level() {
    let app = TestApp::with_settings(GuardSettings {
        min_level: 8,
        ..GuardSettings::default()
    })
    .await;
    let (_, manager) = app
        .staff("manager@test.com", StaffRole::RouteManager, StaffStatus::Active)
        .await;
    let (_, admin) = app
        .staff("admin@test.com", StaffRole::Admin, StaffStatus::Active)
        .await;

    let (status, _) = app.send(get("/api/v1/auth/level", Some(&manager))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(get("/api/v1/auth/level", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["level"], 9);
}

#[tokio::test]
async fn test_level_above_role_range() {
    let app = TestApp::new().await;
    let (principal, _) = app
        .staff("driver@test.com", StaffRole::Driver, StaffStatus::Active)
        .await;

    let token = token_with_audience(&principal, vec!["staff:300".to_string()]);
    let (status, body) = app.send(get("/api/v1/auth/level", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["level"], 300);
}

#[tokio::test]
async fn test_level_endpoint() {
    let app = TestApp::new().await;
    let (principal, token) = app
        .staff("manager@test.com", StaffRole::RouteManager, StaffStatus::Active)
        .await;

    let (status, body) = app.send(get("/api/v1/auth/level", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["level"], 7);
    assert_eq!(body["data"]["staff_id"], principal.id);
    assert_eq!(body["data"]["subject"], principal.id.to_string());
    assert_eq!(body["data"]["role"], "route_manager");
}

// =============================================================================
// Status checks
// =============================================================================

#[tokio::test]
async fn test_non_active_staff_forbidden() {
    let app = TestApp::new().await;

    for (email, status) in [
        ("leave@test.com", StaffStatus::OnLeave),
        ("inactive@test.com", StaffStatus::Inactive),
    ] {
        let (_, token) = app.staff(email, StaffRole::Driver, status).await;
        let (code, body) = app.send(get("/api/v1/auth/me", Some(&token))).await;
        assert_eq!(code, StatusCode::FORBIDDEN);
        assert_eq!(error_message(&body), "account is not active");
    }
}

#[tokio::test]
async fn test_me_after_delete() {
    let app = TestApp::new().await;
    let (principal, token) = app
        .staff("gone@test.com", StaffRole::Driver, StaffStatus::Active)
        .await;
    app.stores.credentials.soft_delete(principal.id).await.unwrap();

    let (status, _) = app.send(get("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Password change
// =============================================================================

#[tokio::test]
async fn test_change_password_flow() {
    let app = TestApp::new().await;
    let (_, token) = app
        .staff("collector@test.com", StaffRole::Collector, StaffStatus::Active)
        .await;

    let (status, _) = app
        .send(json_request(
            Method::PUT,
            "/api/v1/auth/change-password",
            Some(&token),
            json!({"old_password": TEST_PASSWORD, "new_password": "fresh-password"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            json!({"email": "collector@test.com", "password": "fresh-password"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_change_password_rejections() {
    let app = TestApp::new().await;
    let (_, token) = app
        .staff("collector@test.com", StaffRole::Collector, StaffStatus::Active)
        .await;

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            "/api/v1/auth/change-password",
            Some(&token),
            json!({"old_password": "not-my-password", "new_password": "fresh-password"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_message(&body), "old password is incorrect");

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            "/api/v1/auth/change-password",
            Some(&token),
            json!({"old_password": TEST_PASSWORD, "new_password": "short"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "new password must be at least 8 characters"
    );

    let (status, _) = app
        .send(json_request(
            Method::PUT,
            "/api/v1/auth/change-password",
            None,
            json!({"old_password": TEST_PASSWORD, "new_password": "fresh-password"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Socket protocol token
// =============================================================================

#[tokio::test]
async fn test_socket_protocol_token() {
    let app = TestApp::new().await;
    let (principal, token) = app
        .staff("driver@test.com", StaffRole::Driver, StaffStatus::Active)
        .await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/auth/socket")
        .header(header::SEC_WEBSOCKET_PROTOCOL, format!("Bearer, {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], principal.id);

    // Authorization header is not consulted for sockets
    let (status, _) = app.send(get("/api/v1/auth/socket", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
