//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use dawn_core::entities::Message;
use dawn_core::error::DomainError;
use dawn_core::traits::{HistoryCursor, MessageQuery, MessageRepository, RepoResult};
use dawn_core::value_objects::{MessageId, RoomId};

use crate::mappers::MessageInsert;
use crate::models::MessageModel;

use super::error::{map_db_error, map_unique_violation, room_not_found};

const MESSAGE_COLUMNS: &str = "id, room_id, sender_id, sender_nickname, sender_avatar_url, content, \
     image_url, reply_to_id, reply_sender_nickname, reply_content_preview, created_at, deleted";

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Message>> {
        let result = sqlx::query_as::<_, MessageModel>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE id = $1"
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Message::from))
    }

    #[instrument(skip(self))]
    async fn find_by_room(&self, room_id: RoomId, query: MessageQuery) -> RepoResult<Vec<Message>> {
        let limit = query.effective_limit();

        let results = match query.before {
            Some(HistoryCursor::Time(before)) => {
                sqlx::query_as::<_, MessageModel>(&format!(
                    r#"
                    SELECT {MESSAGE_COLUMNS}
                    FROM chat_messages
                    WHERE room_id = $1 AND deleted = FALSE AND created_at < $2
                    ORDER BY created_at DESC, seq DESC
                    LIMIT $3
                    "#
                ))
                .bind(room_id.into_inner())
                .bind(before)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            Some(HistoryCursor::Message(anchor_id)) => {
                // Keyset on (created_at, seq) so equal timestamps never straddle a page
                let anchor: Option<(DateTime<Utc>, i64)> = sqlx::query_as(
                    "SELECT created_at, seq FROM chat_messages WHERE id = $1 AND room_id = $2",
                )
                .bind(anchor_id.into_uuid())
                .bind(room_id.into_inner())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

                let (created_at, seq) = anchor.ok_or(DomainError::MessageNotFound(anchor_id))?;

                sqlx::query_as::<_, MessageModel>(&format!(
                    r#"
                    SELECT {MESSAGE_COLUMNS}
                    FROM chat_messages
                    WHERE room_id = $1 AND deleted = FALSE AND (created_at, seq) < ($2, $3)
                    ORDER BY created_at DESC, seq DESC
                    LIMIT $4
                    "#
                ))
                .bind(room_id.into_inner())
                .bind(created_at)
                .bind(seq)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, MessageModel>(&format!(
                    r#"
                    SELECT {MESSAGE_COLUMNS}
                    FROM chat_messages
                    WHERE room_id = $1 AND deleted = FALSE
                    ORDER BY created_at DESC, seq DESC
                    LIMIT $2
                    "#
                ))
                .bind(room_id.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Message::from).collect())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id, room_id = %message.room_id))]
    async fn create(&self, message: &Message) -> RepoResult<()> {
        let insert = MessageInsert::new(message);

        sqlx::query(
            r#"
            INSERT INTO chat_messages (
                id, room_id, sender_id, sender_nickname, sender_avatar_url, content, image_url,
                reply_to_id, reply_sender_nickname, reply_content_preview, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(insert.id)
        .bind(insert.room_id)
        .bind(insert.sender_id)
        .bind(insert.sender_nickname)
        .bind(insert.sender_avatar_url)
        .bind(insert.content)
        .bind(insert.image_url)
        .bind(insert.reply_to_id)
        .bind(insert.reply_sender_nickname)
        .bind(insert.reply_content_preview)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation())
            {
                return room_not_found(message.room_id);
            }
            map_unique_violation(e, || {
                DomainError::ValidationError(format!("duplicate message id {}", message.id))
            })
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: MessageId) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE chat_messages
            SET deleted = TRUE
            WHERE id = $1 AND deleted = FALSE
            "#,
        )
        .bind(id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
