//! # Login Tests

use super::*;
use lib_auth::decode_jwt;
use lib_core::dto::ErrorResponse;
use crate::test_utils::TEST_SECRET;

#[tokio::test]
async fn test_login_token_carries_identity() {
    // Arrange
    let (app, _pool) = auth_app().await;
    let (_, registered) = register(&app, json!({ "email": "a@x.com", "password": "secret1" })).await;
    let user_id = registered["user"]["id"].as_str().unwrap().to_string();

    // Act
    let (status, body) = login(&app, "a@x.com", "secret1").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");

    let claims = decode_jwt(body["token"].as_str().unwrap(), TEST_SECRET).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.email, "a@x.com");
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let (app, _pool) = auth_app().await;
    register(&app, json!({ "email": "a@x.com", "password": "secret1" })).await;

    let (status, _) = login(&app, "A@X.COM", "secret1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    // Arrange
    let (app, _pool) = auth_app().await;
    register(&app, json!({ "email": "a@x.com", "password": "secret1" })).await;

    // Act
    let (wrong_pw_status, wrong_pw_body) = login(&app, "a@x.com", "wrong-password").await;
    let (unknown_status, unknown_body) = login(&app, "nobody@x.com", "secret1").await;

    // Assert
    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, unknown_body);

    let error: ErrorResponse = serde_json::from_value(wrong_pw_body).unwrap();
    assert_eq!(error.error, "Invalid email or password");
    assert_eq!(error.code.as_deref(), Some("Auth"));
    assert_eq!(error.details, None);
}

#[tokio::test]
async fn test_login_requires_password() {
    let (app, _pool) = auth_app().await;

    let (status, body) = login(&app, "a@x.com", "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password is required");
}
