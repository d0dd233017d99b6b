//! # Upstream Errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, UpstreamError>;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection, timeout or body read failure.
    #[error("Upstream request failed: {0}")]
    Transport(String),

    /// Non-success status. `message` is the provider's `error` field when it sent one.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Success status but a body we could not use.
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Transport("request timed out".to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}
