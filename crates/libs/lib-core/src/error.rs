//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used by every
//! handler and repository in the backend.
//!
//! ## Error Categories
//!
//! 1. **Client Errors** (4xx)
//!    - [`Validation`](AppError::Validation) → 400 Bad Request
//!    - [`Auth`](AppError::Auth) → 401 Unauthorized
//!    - [`NotFound`](AppError::NotFound) → 404 Not Found
//!    - [`RateLimited`](AppError::RateLimited) → 429 Too Many Requests
//!
//! 2. **Server Errors** (5xx)
//!    - [`Upstream`](AppError::Upstream) → 502 Bad Gateway (AI provider)
//!    - [`Config`](AppError::Config) / [`Internal`](AppError::Internal) → 500
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn require_title(title: &str) -> Result<&str> {
//!     if title.trim().is_empty() {
//!         return Err(AppError::Validation("Title is required".to_string()));
//!     }
//!     Ok(title)
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::dto::ErrorResponse;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or out-of-range client input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing, invalid or expired credentials.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Resource absent, or not owned by the caller. The two cases share one message.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Per-IP quota exhausted. Carries the limiter's message.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The upstream AI provider failed. Carries the provider's error detail.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected failure (persistence, hashing, serialization).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-facing error message.
    ///
    /// Server-side errors return a generic message so no implementation detail leaks.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::NotFound(msg)
            | AppError::RateLimited(msg) => msg.clone(),
            AppError::Upstream(_) => "Failed to get AI response".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Variant name, sent to clients as the `code` field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::Auth(_) => "Auth",
            AppError::NotFound(_) => "NotFound",
            AppError::RateLimited(_) => "RateLimited",
            AppError::Upstream(_) => "Upstream",
            AppError::Config(_) => "Config",
            AppError::Internal(_) => "Internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match status {
            StatusCode::BAD_GATEWAY | StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Server error: {}", self);
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let details = match &self {
            AppError::Upstream(details) => Some(details.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.user_message(),
            code: Some(self.code().to_string()),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                AppError::Internal(format!("Database error: {}", db_err.message()))
            }
            _ => AppError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl From<lib_auth::Error> for AppError {
    fn from(err: lib_auth::Error) -> Self {
        match err {
            lib_auth::Error::InvalidToken(_) => AppError::Auth("Invalid or expired token".to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Validation(String::new()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Auth(String::new()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound(String::new()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RateLimited(String::new()).status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::Upstream(String::new()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::Internal(String::new()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let err = AppError::Internal("disk I/O error at /var/db".to_string());
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn test_invalid_token_maps_to_auth() {
        let err: AppError = lib_auth::Error::InvalidToken("ExpiredSignature".to_string()).into();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_upstream_body_carries_details() {
        let response = AppError::Upstream("quota exceeded".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Failed to get AI response");
        assert_eq!(json["code"], "Upstream");
        assert_eq!(json["details"], "quota exceeded");
    }

    #[tokio::test]
    async fn test_client_error_body_has_no_details() {
        let response = AppError::NotFound("Conversation not found".to_string()).into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            parsed,
            ErrorResponse {
                error: "Conversation not found".to_string(),
                code: Some("NotFound".to_string()),
                details: None,
            }
        );
        assert!(!String::from_utf8_lossy(&body).contains("details"));
    }
}
