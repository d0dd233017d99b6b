//! # Core Library
//!
//! Configuration, error taxonomy, DTOs and the persistence layer for the chat backend.

pub mod config;
pub mod dto;
pub mod error;
pub mod model;

// Re-export commonly used types
pub use config::{Config, RateLimitConfig, RateLimitRule};
pub use error::{AppError, Result};
pub use model::store::{create_pool, DbPool, MIGRATOR};
