//! PostgreSQL implementation of RoomRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use dawn_core::entities::{MemberRole, NewRoom, Room, RoomSummary};
use dawn_core::error::DomainError;
use dawn_core::traits::{RepoResult, RoomRepository};
use dawn_core::value_objects::{ParticipantId, RoomId};

use crate::models::{RoomModel, RoomSummaryModel};

use super::error::{map_db_error, room_not_found};

const ROOM_COLUMNS: &str = "r.id, r.name, r.room_type, r.created_by, r.icon_url, r.created_at, \
     r.last_message_at, r.last_message_preview";

/// PostgreSQL implementation of RoomRepository
#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    /// Create a new PgRoomRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: RoomId) -> RepoResult<Option<Room>> {
        let result = sqlx::query_as::<_, RoomModel>(&format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms r WHERE r.id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Room::from))
    }

    #[instrument(skip(self))]
    async fn create_with_members(
        &self,
        room: &NewRoom,
        members: &[(ParticipantId, MemberRole)],
    ) -> RepoResult<Room> {
        if members.is_empty() {
            return Err(DomainError::ValidationError(
                "a room needs at least one member".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let model = sqlx::query_as::<_, RoomModel>(
            r#"
            INSERT INTO chat_rooms (name, room_type, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, name, room_type, created_by, icon_url, created_at, last_message_at,
                      last_message_preview
            "#,
        )
        .bind(room.name.as_deref())
        .bind(room.room_type.as_str())
        .bind(room.created_by.map(ParticipantId::into_inner))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        for (participant_id, role) in members {
            sqlx::query(
                r#"
                INSERT INTO chat_room_members (room_id, participant_id, role)
                VALUES ($1, $2, $3)
                ON CONFLICT (room_id, participant_id) DO NOTHING
                "#,
            )
            .bind(model.id)
            .bind(participant_id.into_inner())
            .bind(role.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(Room::from(model))
    }

    #[instrument(skip(self))]
    async fn find_dm_between(&self, a: ParticipantId, b: ParticipantId) -> RepoResult<Option<Room>> {
        let result = sqlx::query_as::<_, RoomModel>(&format!(
            r#"
            SELECT {ROOM_COLUMNS}
            FROM chat_rooms r
            WHERE r.room_type = 'dm'
              AND EXISTS (SELECT 1 FROM chat_room_members m WHERE m.room_id = r.id AND m.participant_id = $1)
              AND EXISTS (SELECT 1 FROM chat_room_members m WHERE m.room_id = r.id AND m.participant_id = $2)
            LIMIT 1
            "#
        ))
        .bind(a.into_inner())
        .bind(b.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Room::from))
    }

    #[instrument(skip(self))]
    async fn find_for_participant(&self, participant_id: ParticipantId) -> RepoResult<Vec<RoomSummary>> {
        // Unread = other participants' live messages newer than the member's read marker
        let results = sqlx::query_as::<_, RoomSummaryModel>(&format!(
            r#"
            SELECT {ROOM_COLUMNS},
                   (
                       SELECT COUNT(*)
                       FROM chat_messages msg
                       WHERE msg.room_id = r.id
                         AND msg.deleted = FALSE
                         AND msg.sender_id <> $1
                         AND (mem.last_read_at IS NULL OR msg.created_at > mem.last_read_at)
                   ) AS unread_count
            FROM chat_rooms r
            JOIN chat_room_members mem ON mem.room_id = r.id
            WHERE mem.participant_id = $1
            ORDER BY COALESCE(r.last_message_at, r.created_at) DESC, r.id DESC
            "#
        ))
        .bind(participant_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(RoomSummary::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> RepoResult<Vec<Room>> {
        let results = sqlx::query_as::<_, RoomModel>(&format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms r ORDER BY r.id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Room::from).collect())
    }

    #[instrument(skip(self, preview))]
    async fn update_last_message(
        &self,
        id: RoomId,
        at: DateTime<Utc>,
        preview: &str,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE chat_rooms
            SET last_message_at = $2, last_message_preview = $3
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .bind(at)
        .bind(preview)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(room_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_icon(&self, id: RoomId, icon_url: Option<&str>) -> RepoResult<Room> {
        let result = sqlx::query_as::<_, RoomModel>(
            r#"
            UPDATE chat_rooms
            SET icon_url = $2
            WHERE id = $1
            RETURNING id, name, room_type, created_by, icon_url, created_at, last_message_at,
                      last_message_preview
            "#,
        )
        .bind(id.into_inner())
        .bind(icon_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Room::from).ok_or_else(|| room_not_found(id))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: RoomId) -> RepoResult<bool> {
        // Members and messages go with the room via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM chat_rooms WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgRoomRepository>();
    }
}
