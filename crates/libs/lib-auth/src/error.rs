//! # Authentication Errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Signature mismatch, malformed token, or expired `exp` claim.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Failed to encode token: {0}")]
    TokenEncode(String),

    #[error("Failed to hash password: {0}")]
    PasswordHash(String),

    /// The stored hash could not be parsed as a PHC string.
    #[error("Malformed password hash: {0}")]
    MalformedHash(String),
}
