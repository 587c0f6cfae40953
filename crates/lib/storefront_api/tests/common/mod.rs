//! Shared helpers: an in-memory app and JSON request plumbing.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use storefront_api::{AppState, config::ApiConfig};
use storefront_core::store::Stores;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "Password123";

pub fn state() -> AppState {
    AppState::new(Stores::in_memory(), ApiConfig::with_secret(SECRET))
}

pub fn app(state: &AppState) -> Router {
    storefront_api::router(state.clone())
}

pub async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_with(state, method, uri, token, &[], body).await
}

pub async fn send_with(
    state: &AppState,
    method: &str,
    uri: &str,
    token: Option<&str>,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    for (name, value) in headers {
        req = req.header(*name, *value);
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app(state).oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Register a customer and return (token, id).
pub async fn customer(state: &AppState, email: &str) -> (String, String) {
    let (status, body) = send(
        state,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Customer", "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register customer: {body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["_id"].as_str().unwrap().to_string(),
    )
}

/// Register the Owner and return its token.
pub async fn owner(state: &AppState) -> String {
    let (status, body) = send(
        state,
        "POST",
        "/api/admin/auth/register",
        None,
        Some(json!({ "name": "Owner", "email": "owner@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register owner: {body}");
    body["token"].as_str().unwrap().to_string()
}
