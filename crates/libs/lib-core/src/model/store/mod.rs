//! # Database Store
//!
//! Database connection pool, embedded migrations and repository implementations.

// region: --- Modules
pub mod conversation_repository;
pub mod message_repository;
pub mod models;
pub mod user_repository;
// endregion: --- Modules

// region: --- Re-exports
pub use conversation_repository::ConversationRepository;
pub use message_repository::MessageRepository;
pub use models::{
    Conversation, Message, MessageRole, Page, User, UserForCreate, DEFAULT_CONVERSATION_TITLE,
};
pub use user_repository::UserRepository;
// endregion: --- Re-exports

// region: --- Types and Functions
use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Type alias for SQLite connection pool.
pub type DbPool = SqlitePool;

/// Schema migrations compiled into the binary.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create a SQLite connection pool for `database_url`.
///
/// The database file is created if missing and foreign keys are enforced.
/// Migrations are not run here; call [`MIGRATOR`] once the pool exists.
pub async fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    Ok(pool)
}
// endregion: --- Types and Functions

// region: --- Test Support
/// Fresh in-memory database with the schema applied.
///
/// Single connection with no idle reaping: each in-memory connection is its own database.
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to create test database");

    MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    pool
}
// endregion: --- Test Support
