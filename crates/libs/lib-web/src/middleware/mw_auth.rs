//! # Authentication Extractor
//!
//! Validates the `Authorization: Bearer <token>` header and hands the handler an
//! explicit [`CurrentUser`] value. Handlers that take a `CurrentUser` argument are
//! protected; there is no separate auth layer to forget.
//!
//! ```rust,ignore
//! async fn profile(user: CurrentUser) -> String {
//!     format!("Hello, {}!", user.email)
//! }
//! ```

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use lib_auth::decode_jwt;
use lib_core::{AppError, Config};
use tracing::{debug, warn};

/// The authenticated caller, decoded from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    Config: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| {
                warn!("[AUTH] Missing or malformed Authorization header");
                AppError::Auth("No token provided".to_string())
            })?;

        let config = Config::from_ref(state);
        let claims = decode_jwt(token, &config.jwt_secret).map_err(|e| {
            warn!("[AUTH] JWT validation failed: {}", e);
            AppError::Auth("Invalid or expired token".to_string())
        })?;

        debug!("[AUTH] Authenticated user: {} (id: {})", claims.email, claims.sub);

        Ok(CurrentUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}
