//! # HTTP Request Handlers
//!
//! Axum handlers organized by feature area.
//!
//! - **[`auth`]**: register, login, profile
//! - **[`conversations`]**: conversation CRUD, scoped to the caller
//! - **[`chat`]**: send a message (one-shot or streamed over SSE), delete a message
//! - **[`health`]**: liveness check
//!
//! Handlers take a [`CurrentUser`](crate::middleware::CurrentUser) when they need an
//! authenticated caller and a [`ValidatedJson`](crate::middleware::ValidatedJson) when
//! they take a body, and return `Result<_, AppError>`:
//!
//! ```rust,ignore
//! async fn handler(
//!     State(pool): State<DbPool>,
//!     user: CurrentUser,
//!     ValidatedJson(req): ValidatedJson<RequestBody>,
//! ) -> Result<Json<Response>, AppError> {
//!     Ok(Json(response))
//! }
//! ```

pub mod auth;
pub mod chat;
pub mod conversations;
pub mod health;
