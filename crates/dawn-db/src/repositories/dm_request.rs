//! PostgreSQL implementation of DmRequestRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use dawn_core::entities::{DmRequest, DmRequestStatus};
use dawn_core::error::DomainError;
use dawn_core::traits::{DmRequestRepository, RepoResult};
use dawn_core::value_objects::{DmRequestId, ParticipantId};

use crate::models::DmRequestModel;

use super::error::{dm_request_not_found, map_db_error, map_unique_violation};

/// PostgreSQL implementation of DmRequestRepository
#[derive(Clone)]
pub struct PgDmRequestRepository {
    pool: PgPool,
}

impl PgDmRequestRepository {
    /// Create a new PgDmRequestRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DmRequestRepository for PgDmRequestRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: DmRequestId) -> RepoResult<Option<DmRequest>> {
        let result = sqlx::query_as::<_, DmRequestModel>(
            r#"
            SELECT id, from_participant_id, to_participant_id, message, status, created_at, updated_at
            FROM chat_dm_requests
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(DmRequest::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_pending_between(&self, from: ParticipantId, to: ParticipantId) -> RepoResult<Option<DmRequest>> {
        let result = sqlx::query_as::<_, DmRequestModel>(
            r#"
            SELECT id, from_participant_id, to_participant_id, message, status, created_at, updated_at
            FROM chat_dm_requests
            WHERE from_participant_id = $1 AND to_participant_id = $2 AND status = 'pending'
            LIMIT 1
            "#,
        )
        .bind(from.into_inner())
        .bind(to.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(DmRequest::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_for_participant(&self, participant_id: ParticipantId) -> RepoResult<Vec<DmRequest>> {
        let results = sqlx::query_as::<_, DmRequestModel>(
            r#"
            SELECT id, from_participant_id, to_participant_id, message, status, created_at, updated_at
            FROM chat_dm_requests
            WHERE from_participant_id = $1 OR to_participant_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(participant_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(DmRequest::try_from).collect()
    }

    #[instrument(skip(self, message))]
    async fn create(
        &self,
        from: ParticipantId,
        to: ParticipantId,
        message: Option<&str>,
    ) -> RepoResult<DmRequest> {
        let model = sqlx::query_as::<_, DmRequestModel>(
            r#"
            INSERT INTO chat_dm_requests (from_participant_id, to_participant_id, message)
            VALUES ($1, $2, $3)
            RETURNING id, from_participant_id, to_participant_id, message, status, created_at, updated_at
            "#,
        )
        .bind(from.into_inner())
        .bind(to.into_inner())
        .bind(message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::DmRequestAlreadySent))?;

        DmRequest::try_from(model)
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: DmRequestId, status: DmRequestStatus) -> RepoResult<DmRequest> {
        let result = sqlx::query_as::<_, DmRequestModel>(
            r#"
            UPDATE chat_dm_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, from_participant_id, to_participant_id, message, status, created_at, updated_at
            "#,
        )
        .bind(id.into_inner())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        match result {
            Some(model) => DmRequest::try_from(model),
            None => Err(dm_request_not_found(id)),
        }
    }
}
