//! # Data Transfer Objects (DTOs)
//!
//! Request and response bodies for the REST API. All JSON uses camelCase field names.
//!
//! Request DTOs implement [`Validate`], which checks field constraints and returns the
//! normalized value (trimmed strings, lowercased email). Handlers only ever see
//! validated requests.

pub mod auth;
pub mod chat;
pub mod conversation;

pub use auth::*;
pub use chat::*;
pub use conversation::*;

use uuid::Uuid;

use crate::error::{AppError, Result};

/// Boundary validation for request bodies.
pub trait Validate: Sized {
    /// Check constraints, returning the normalized request or a `Validation` error.
    fn validate(self) -> Result<Self>;
}

/// Parse a client-supplied id. `label` names the id in the error, e.g. "conversation".
pub fn parse_id(value: &str, label: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| AppError::Validation(format!("Invalid {} ID", label)))
}

/// Turn a lib-utils validation message into a `Validation` error.
pub(crate) fn invalid(msg: String) -> AppError {
    AppError::Validation(msg)
}
