//! # Auth Handler Tests
//!
//! Test suite for registration, login and profile handlers.

mod login;

use crate::test_utils::{json_request, send, setup_test_db, test_app, test_config};
use axum::http::StatusCode;
use axum::Router;
use lib_core::DbPool;
use serde_json::{json, Value};

/// App over a fresh database. The upstream is never called by auth routes.
pub async fn auth_app() -> (Router, DbPool) {
    let pool = setup_test_db().await;
    (test_app(pool.clone(), test_config("http://unused")), pool)
}

pub async fn register(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, json_request("POST", "/api/auth/register", None, Some(body))).await
}

pub async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        ),
    )
    .await
}
