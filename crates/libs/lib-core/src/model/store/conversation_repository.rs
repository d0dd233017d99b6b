//! # Conversation Repository
//!
//! Every query is scoped by the owning user id. A conversation that exists but
//! belongs to someone else is reported exactly like a missing one (`None`/`false`).

use super::models::{Conversation, Page};
use super::DbPool;
use lib_utils::now_utc;
use sqlx::query_as;
use uuid::Uuid;

pub struct ConversationRepository;

impl ConversationRepository {
    pub async fn create(pool: &DbPool, user_id: &str, title: &str) -> Result<Conversation, sqlx::Error> {
        let now = now_utc();
        let conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO conversations (id, user_id, title, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&conversation.id)
        .bind(&conversation.user_id)
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(pool)
        .await?;

        Ok(conversation)
    }

    /// Find a conversation by id, only if owned by `user_id`.
    pub async fn find_for_user(
        pool: &DbPool,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Conversation>, sqlx::Error> {
        query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// One page of the user's conversations, most recently updated first.
    ///
    /// `page` and `limit` must be positive; callers normalize them first. A page past
    /// the end, however large, is empty.
    pub async fn list_for_user(
        pool: &DbPool,
        user_id: &str,
        page: i64,
        limit: i64,
    ) -> Result<Page<Conversation>, sqlx::Error> {
        let offset = page.saturating_sub(1).saturating_mul(limit);

        let items = query_as::<_, Conversation>(
            "SELECT * FROM conversations
             WHERE user_id = ?
             ORDER BY updated_at DESC, rowid DESC
             LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM conversations WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(Page { items, page, limit, total })
    }

    /// Rename a conversation owned by `user_id`. Returns the updated record.
    pub async fn update_title(
        pool: &DbPool,
        id: &str,
        user_id: &str,
        title: &str,
    ) -> Result<Option<Conversation>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE conversations SET title = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(title)
        .bind(now_utc())
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_for_user(pool, id, user_id).await
    }

    /// Delete a conversation owned by `user_id` together with all of its messages.
    ///
    /// Returns `false` when nothing matched.
    pub async fn delete_for_user(pool: &DbPool, id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM conversations WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if owned == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
