//! Shared helpers for API integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use wastedesk_api::{AppState, GuardSettings, build_router};
use wastedesk_auth::test_utils::{self, TestStores};
use wastedesk_auth::{AuthService, Principal, StaffRole, StaffStatus};

pub struct TestApp {
    pub router: Router,
    pub stores: TestStores,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(GuardSettings::default()).await
    }

    pub async fn with_settings(settings: GuardSettings) -> Self {
        let stores = TestStores::new().await;
        let service = AuthService::new(
            stores.credentials.clone(),
            stores.permissions.clone(),
            Arc::new(test_utils::test_token_service()),
        );
        let router = build_router(AppState::new(service, settings));

        Self { router, stores }
    }

    /// Create a staff member and return it with a valid token
    pub async fn staff(&self, email: &str, role: StaffRole, status: StaffStatus) -> (Principal, String) {
        let principal = self.stores.add_staff(email, role, status).await;
        let token = test_utils::test_token(&principal);
        (principal, token)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, response_json(response).await)
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(json!({}))
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn get_with_auth_header(uri: &str, value: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, value)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::DELETE).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// First error message of an error envelope
pub fn error_message(body: &Value) -> &str {
    body["errors"][0]["message"].as_str().unwrap_or_default()
}
