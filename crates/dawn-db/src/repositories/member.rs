//! PostgreSQL implementation of MemberRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use dawn_core::entities::{MemberRole, RoomMember};
use dawn_core::error::DomainError;
use dawn_core::traits::{MemberRepository, RepoResult};
use dawn_core::value_objects::{ParticipantId, RoomId};

use crate::models::RoomMemberModel;

use super::error::{map_db_error, map_unique_violation, member_not_found, room_not_found};

/// PostgreSQL implementation of MemberRepository
#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    /// Create a new PgMemberRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    #[instrument(skip(self))]
    async fn is_member(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM chat_room_members WHERE room_id = $1 AND participant_id = $2
            )
            "#,
        )
        .bind(room_id.into_inner())
        .bind(participant_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn find(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<Option<RoomMember>> {
        let result = sqlx::query_as::<_, RoomMemberModel>(
            r#"
            SELECT room_id, participant_id, role, joined_at, last_read_at
            FROM chat_room_members
            WHERE room_id = $1 AND participant_id = $2
            "#,
        )
        .bind(room_id.into_inner())
        .bind(participant_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(RoomMember::from))
    }

    #[instrument(skip(self))]
    async fn find_by_room(&self, room_id: RoomId) -> RepoResult<Vec<RoomMember>> {
        let results = sqlx::query_as::<_, RoomMemberModel>(
            r#"
            SELECT room_id, participant_id, role, joined_at, last_read_at
            FROM chat_room_members
            WHERE room_id = $1
            ORDER BY joined_at, participant_id
            "#,
        )
        .bind(room_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(RoomMember::from).collect())
    }

    #[instrument(skip(self))]
    async fn add(&self, room_id: RoomId, participant_id: ParticipantId, role: MemberRole) -> RepoResult<RoomMember> {
        let model = sqlx::query_as::<_, RoomMemberModel>(
            r#"
            INSERT INTO chat_room_members (room_id, participant_id, role)
            VALUES ($1, $2, $3)
            RETURNING room_id, participant_id, role, joined_at, last_read_at
            "#,
        )
        .bind(room_id.into_inner())
        .bind(participant_id.into_inner())
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation())
            {
                return room_not_found(room_id);
            }
            map_unique_violation(e, || DomainError::AlreadyMember)
        })?;

        Ok(RoomMember::from(model))
    }

    #[instrument(skip(self))]
    async fn remove(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM chat_room_members WHERE room_id = $1 AND participant_id = $2
            "#,
        )
        .bind(room_id.into_inner())
        .bind(participant_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE chat_room_members
            SET last_read_at = NOW()
            WHERE room_id = $1 AND participant_id = $2
            "#,
        )
        .bind(room_id.into_inner())
        .bind(participant_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(member_not_found());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgMemberRepository>();
    }
}
