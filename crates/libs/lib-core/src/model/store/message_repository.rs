//! # Message Repository
//!
//! Messages are ordered by `created_at`, with insertion order (`rowid`) breaking ties.
//! Ownership is checked through the parent conversation.

use super::models::{Message, MessageRole};
use super::DbPool;
use lib_utils::now_utc;
use sqlx::query_as;
use uuid::Uuid;

pub struct MessageRepository;

impl MessageRepository {
    /// Append a message and touch the parent conversation's `updated_at`, atomically.
    pub async fn create(
        pool: &DbPool,
        conversation_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, sqlx::Error> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            role,
            content: content.to_string(),
            created_at: now_utc(),
        };

        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO messages (id, conversation_id, role, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(message.created_at)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(message)
    }

    /// All messages of a conversation, oldest first.
    pub async fn list_for_conversation(
        pool: &DbPool,
        conversation_id: &str,
    ) -> Result<Vec<Message>, sqlx::Error> {
        query_as::<_, Message>(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
    }

    /// The `limit` most recent messages of a conversation, oldest first.
    pub async fn recent_for_conversation(
        pool: &DbPool,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let mut messages = query_as::<_, Message>(
            "SELECT * FROM messages WHERE conversation_id = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }

    /// Find a message whose parent conversation is owned by `user_id`.
    ///
    /// Missing messages, orphaned messages and messages owned by other users all yield `None`.
    pub async fn find_for_user(
        pool: &DbPool,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Message>, sqlx::Error> {
        query_as::<_, Message>(
            "SELECT m.* FROM messages m
             JOIN conversations c ON c.id = m.conversation_id
             WHERE m.id = ? AND c.user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Delete a single message. Returns `false` when nothing matched.
    pub async fn delete(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_for_conversation(pool: &DbPool, conversation_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
            .bind(conversation_id)
            .fetch_one(pool)
            .await
    }
}
