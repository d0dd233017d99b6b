//! # Authentication Handlers
//!
//! Registration, login and profile lookup.
//!
//! ## Example
//!
//! ```rust,ignore
//! use axum::{Router, routing::{get, post}};
//! use lib_web::handlers::auth::{register, login, profile};
//!
//! let app = Router::new()
//!     .route("/api/auth/register", post(register))
//!     .route("/api/auth/login", post(login))
//!     .route("/api/auth/profile", get(profile));
//! ```

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use lib_auth::{encode_jwt, hash_password, verify_password};
use lib_core::dto::{
    AuthResponse, ErrorResponse, LoginRequest, ProfileResponse, RegisterRequest, UserInfo,
};
use lib_core::model::store::user_repository::is_unique_violation;
use lib_core::model::store::{User, UserForCreate, UserRepository};
use lib_core::{AppError, Config, DbPool};
use tracing::{debug, info, instrument, warn};
use utoipa::OpenApi;

use crate::middleware::{CurrentUser, ValidatedJson};

#[derive(OpenApi)]
#[openapi(
    paths(register, login, profile),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        UserInfo,
        ProfileResponse,
        ErrorResponse
    ))
)]
pub struct AuthApi;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_TAKEN: &str = "Email already registered";

/// Register handler - creates a new user account and signs them in.
///
/// # Returns
///
/// * `201` with [`AuthResponse`] on success
/// * `400` if validation fails or the email is already registered
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid body or email taken", body = ErrorResponse),
        (status = 429, description = "Too many auth attempts", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(email = %req.email))]
pub async fn register(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    info!("[REGISTER] New user registration request");

    if UserRepository::find_by_email(&pool, &req.email).await?.is_some() {
        warn!("[REGISTER] Email already registered");
        return Err(AppError::Validation(EMAIL_TAKEN.to_string()));
    }

    debug!("[REGISTER] Hashing password...");
    let password_hash = hash_password(&req.password)?;

    debug!("[REGISTER] Creating user in database...");
    let user = UserRepository::create(&pool, UserForCreate::new(req.email, password_hash, req.name))
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration for the same email
            if is_unique_violation(&e) {
                AppError::Validation(EMAIL_TAKEN.to_string())
            } else {
                AppError::from(e)
            }
        })?;

    let token = issue_token(&user, &config)?;

    info!("[REGISTER] User created: {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token,
            user: UserInfo::from(&user),
        }),
    ))
}

/// Login handler - verifies credentials and issues a token.
///
/// Unknown email and wrong password produce the same 401 body.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
        (status = 429, description = "Too many auth attempts", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(email = %req.email))]
pub async fn login(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    info!("[LOGIN] Login attempt");

    let Some(user) = UserRepository::find_by_email(&pool, &req.email).await? else {
        warn!("[LOGIN] Unknown email");
        return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!("[LOGIN] Wrong password for user {}", user.id);
        return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue_token(&user, &config)?;

    info!("[LOGIN] User {} logged in", user.id);

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserInfo::from(&user),
    }))
}

/// Profile handler - returns the authenticated user's record.
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse),
    )
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn profile(
    State(pool): State<DbPool>,
    user: CurrentUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let record = UserRepository::find_by_id(&pool, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        user: (&record).into(),
    }))
}

fn issue_token(user: &User, config: &Config) -> Result<String, AppError> {
    debug!("[AUTH] Generating JWT token...");
    Ok(encode_jwt(
        &user.id,
        &user.email,
        &config.jwt_secret,
        config.jwt_expiration_hours,
    )?)
}

#[cfg(test)]
mod tests;
