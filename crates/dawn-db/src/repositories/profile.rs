//! PostgreSQL implementation of ProfileRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use dawn_core::entities::ChatProfile;
use dawn_core::error::DomainError;
use dawn_core::traits::{ProfileRepository, RepoResult};
use dawn_core::value_objects::ParticipantId;

use crate::models::ChatProfileModel;

use super::error::map_db_error;

/// PostgreSQL implementation of ProfileRepository
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    /// Create a new PgProfileRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    #[instrument(skip(self))]
    async fn find(&self, participant_id: ParticipantId) -> RepoResult<Option<ChatProfile>> {
        let result = sqlx::query_as::<_, ChatProfileModel>(
            r#"
            SELECT participant_id, nickname, avatar_url, last_seen_at, created_at, updated_at
            FROM chat_profiles
            WHERE participant_id = $1
            "#,
        )
        .bind(participant_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(ChatProfile::from))
    }

    #[instrument(skip(self, profile), fields(participant_id = %profile.participant_id))]
    async fn insert_if_absent(&self, profile: &ChatProfile) -> RepoResult<ChatProfile> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let model = sqlx::query_as::<_, ChatProfileModel>(
            r#"
            INSERT INTO chat_profiles (participant_id, nickname, avatar_url)
            VALUES ($1, $2, $3)
            ON CONFLICT (participant_id) DO UPDATE SET participant_id = EXCLUDED.participant_id
            RETURNING participant_id, nickname, avatar_url, last_seen_at, created_at, updated_at
            "#,
        )
        .bind(profile.participant_id.into_inner())
        .bind(&profile.nickname)
        .bind(profile.avatar_url.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ChatProfile::from(model))
    }

    #[instrument(skip(self, profile), fields(participant_id = %profile.participant_id))]
    async fn update(&self, profile: &ChatProfile) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE chat_profiles
            SET nickname = $2, avatar_url = $3, updated_at = NOW()
            WHERE participant_id = $1
            "#,
        )
        .bind(profile.participant_id.into_inner())
        .bind(&profile.nickname)
        .bind(profile.avatar_url.as_deref())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ProfileNotFound(profile.participant_id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn record_last_seen(&self, participant_id: ParticipantId, at: DateTime<Utc>) -> RepoResult<()> {
        // Never move the marker backwards; participants without a profile are skipped
        sqlx::query(
            r#"
            UPDATE chat_profiles
            SET last_seen_at = GREATEST(COALESCE(last_seen_at, $2), $2)
            WHERE participant_id = $1
            "#,
        )
        .bind(participant_id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgProfileRepository>();
    }
}
