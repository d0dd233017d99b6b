//! # Middleware
//!
//! Axum middleware and extractors that form the HTTP boundary.
//!
//! ## Modules
//!
//! - **[`mw_auth`]**: bearer token extractor yielding the authenticated principal
//! - **[`mw_validate`]**: JSON body extractor that runs boundary validation
//! - **[`mw_rate_limit`]**: per-IP fixed-window rate limiting
//! - **[`mw_req_stamp`]**: request ID and timestamp stamping
//! - **[`mw_logging`]**: request/response logging

// region: --- Modules
pub mod mw_auth;
pub mod mw_logging;
pub mod mw_rate_limit;
pub mod mw_req_stamp;
pub mod mw_validate;
// endregion: --- Modules

// region: --- Re-exports
pub use mw_auth::CurrentUser;
pub use mw_logging::log_requests;
pub use mw_rate_limit::{rate_limit, RateLimiter};
pub use mw_req_stamp::{stamp_req, RequestStamp};
pub use mw_validate::ValidatedJson;
// endregion: --- Re-exports
