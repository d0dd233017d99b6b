//! # Application Configuration
//!
//! Configuration is loaded from environment variables once at startup, validated,
//! and then passed explicitly to the components that need it (the axum state holds
//! a clone). There is no global instance.
//!
//! ```rust,no_run
//! use lib_core::config::Config;
//!
//! let config = Config::from_env().and_then(|c| c.validate().map(|_| c));
//! ```

use std::time::Duration;

use lib_utils::{get_env, get_env_or, get_env_parse_or};

use crate::error::{AppError, Result};

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Interface the HTTP listener binds to
    pub bind_host: String,

    /// HTTP listen port
    pub port: u16,

    /// SQLite database connection URL
    pub database_url: String,

    /// Secret key for JWT token signing and verification
    ///
    /// **Must be at least 32 characters long** for security.
    pub jwt_secret: String,

    /// JWT token validity period in hours
    ///
    /// Valid range: 1-720 hours (1 hour to 30 days)
    pub jwt_expiration_hours: i64,

    /// Bearer key sent to the upstream AI provider
    pub upstream_api_key: String,

    /// Base URL of the upstream AI provider (the client appends `/chat`)
    pub upstream_api_url: String,

    /// Deployment environment name, reported by the health endpoint
    pub environment: String,

    /// Number of trailing messages sent upstream as conversational context
    pub context_window: usize,

    /// Allowed CORS origins; empty means any origin
    pub cors_allowed_origins: Vec<String>,

    /// Per-IP request quotas
    pub rate_limits: RateLimitConfig,
}

/// A fixed-window quota: at most `max_requests` per `window`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitRule {
    pub max_requests: u32,
    pub window: Duration,
    pub message: String,
}

impl RateLimitRule {
    pub fn new(max_requests: u32, window: Duration, message: impl Into<String>) -> Self {
        Self {
            max_requests,
            window,
            message: message.into(),
        }
    }
}

/// Rate limit quotas for the three traffic classes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Applied to every route
    pub general: RateLimitRule,
    /// Applied to register and login
    pub auth: RateLimitRule,
    /// Applied to the send-message routes
    pub chat: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general: RateLimitRule::new(
                100,
                Duration::from_secs(15 * 60),
                "Too many requests from this IP, please try again later",
            ),
            auth: RateLimitRule::new(
                5,
                Duration::from_secs(15 * 60),
                "Too many login attempts, please try again later",
            ),
            chat: RateLimitRule::new(
                20,
                Duration::from_secs(60),
                "Too many messages sent, please slow down",
            ),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = get_env("JWT_SECRET").map_err(config_err)?;

        let cors_allowed_origins = get_env_or("CORS_ALLOWED_ORIGINS", "")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            bind_host: get_env_or("BIND_HOST", "0.0.0.0"),
            port: get_env_parse_or("PORT", 3000).map_err(config_err)?,
            database_url: get_env_or("DATABASE_URL", "sqlite:data/chat.db"),
            jwt_secret,
            jwt_expiration_hours: get_env_parse_or("JWT_EXPIRATION_HOURS", 168).map_err(config_err)?,
            upstream_api_key: get_env_or("UPSTREAM_API_KEY", ""),
            upstream_api_url: get_env_or("UPSTREAM_API_URL", "https://api.stack-ai.com/v1"),
            environment: get_env_or("APP_ENV", "development"),
            context_window: get_env_parse_or("AI_CONTEXT_WINDOW", 20).map_err(config_err)?,
            cors_allowed_origins,
            rate_limits: RateLimitConfig::default(),
        })
    }

    /// Validate configuration values against security and business rules.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.chars().count() < 32 {
            return Err(AppError::Config(
                "JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }

        if !(1..=720).contains(&self.jwt_expiration_hours) {
            return Err(AppError::Config(
                "JWT_EXPIRATION_HOURS must be between 1 and 720 (30 days)".to_string(),
            ));
        }

        if self.context_window == 0 {
            return Err(AppError::Config(
                "AI_CONTEXT_WINDOW must be at least 1".to_string(),
            ));
        }

        if self.upstream_api_key.is_empty() {
            tracing::warn!("[CONFIG] UPSTREAM_API_KEY is empty, upstream calls will likely be rejected");
        }

        Ok(())
    }

    /// Listener address in `host:port` form.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn config_err(err: lib_utils::envs::Error) -> AppError {
    AppError::Config(err.to_string())
}
