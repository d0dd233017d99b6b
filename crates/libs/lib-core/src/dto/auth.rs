//! # Authentication Data Transfer Objects
//!
//! Request and response structures for the authentication endpoints.
//!
//! ## Endpoints Using These DTOs
//!
//! - `POST /api/auth/register` - [`RegisterRequest`] -> [`AuthResponse`] (201)
//! - `POST /api/auth/login` - [`LoginRequest`] -> [`AuthResponse`]
//! - `GET /api/auth/profile` - bearer token -> [`ProfileResponse`]
//!
//! ## Login Flow
//!
//! ```text
//! POST /api/auth/login
//! Content-Type: application/json
//!
//! { "email": "alice@example.com", "password": "secret1" }
//! ```
//!
//! Response:
//! ```text
//! {
//!   "message": "Login successful",
//!   "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
//!   "user": { "id": "5f0c...", "email": "alice@example.com", "name": "Alice" }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use lib_utils::{normalize_email, validate_email, validate_length, validate_min_length, validate_not_empty};

use super::{invalid, Validate};
use crate::error::Result;
use crate::model::store::User;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Registration request.
///
/// # Validation Rules
///
/// - `email` must be a valid address; it is trimmed and lowercased before storage
/// - `password` must be at least [`MIN_PASSWORD_LEN`] characters
/// - `name` is optional; when present it is trimmed and must be 1-100 characters
///
/// # Security Note
///
/// The password is hashed with Argon2 immediately. Never log this struct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(self) -> Result<Self> {
        let email = normalize_email(&self.email);
        validate_email(&email).map_err(invalid)?;

        validate_min_length(&self.password, MIN_PASSWORD_LEN, "Password").map_err(invalid)?;

        let name = match self.name {
            Some(name) => {
                let name = name.trim().to_string();
                validate_length(&name, 1, 100, "Name").map_err(invalid)?;
                Some(name)
            }
            None => None,
        };

        Ok(Self {
            email,
            password: self.password,
            name,
        })
    }
}

/// Login request. Email is normalized the same way as on registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(self) -> Result<Self> {
        let email = normalize_email(&self.email);
        validate_email(&email).map_err(invalid)?;
        validate_not_empty(&self.password, "Password").map_err(invalid)?;

        Ok(Self {
            email,
            password: self.password,
        })
    }
}

/// Response for successful register or login.
///
/// The `token` goes in subsequent requests as:
/// ```text
/// Authorization: Bearer <token>
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserInfo,
}

/// Public user information. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Profile view of the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for ProfileUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ProfileResponse {
    pub user: ProfileUser,
}

/// Error body returned by every endpoint.
///
/// `code` carries the error variant name and `details` is only present on upstream failures.
///
/// ```json
/// { "error": "Invalid email or password", "code": "Auth" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
