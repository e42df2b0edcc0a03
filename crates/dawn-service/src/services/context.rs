//! Service context - dependency container for services
//!
//! Holds the chat store repositories every service works against.

use std::sync::Arc;

use dawn_core::traits::{
    DmRequestRepository, MemberRepository, MessageRepository, ProfileRepository, RoomRepository,
};
use dawn_db::{
    MemoryChatStore, PgDmRequestRepository, PgMemberRepository, PgMessageRepository, PgPool,
    PgProfileRepository, PgRoomRepository,
};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct ServiceContext {
    room_repo: Arc<dyn RoomRepository>,
    member_repo: Arc<dyn MemberRepository>,
    message_repo: Arc<dyn MessageRepository>,
    dm_request_repo: Arc<dyn DmRequestRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        room_repo: Arc<dyn RoomRepository>,
        member_repo: Arc<dyn MemberRepository>,
        message_repo: Arc<dyn MessageRepository>,
        dm_request_repo: Arc<dyn DmRequestRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            room_repo,
            member_repo,
            message_repo,
            dm_request_repo,
            profile_repo,
        }
    }

    /// Context backed by PostgreSQL repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgRoomRepository::new(pool.clone())),
            Arc::new(PgMemberRepository::new(pool.clone())),
            Arc::new(PgMessageRepository::new(pool.clone())),
            Arc::new(PgDmRequestRepository::new(pool.clone())),
            Arc::new(PgProfileRepository::new(pool)),
        )
    }

    /// Context backed by one in-memory store
    pub fn in_memory(store: Arc<MemoryChatStore>) -> Self {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    // === Repositories ===

    /// Get the room repository
    pub fn room_repo(&self) -> &dyn RoomRepository {
        self.room_repo.as_ref()
    }

    /// Get the member repository
    pub fn member_repo(&self) -> &dyn MemberRepository {
        self.member_repo.as_ref()
    }

    /// Get the message repository
    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    /// Get the DM request repository
    pub fn dm_request_repo(&self) -> &dyn DmRequestRepository {
        self.dm_request_repo.as_ref()
    }

    /// Get the chat profile repository
    pub fn profile_repo(&self) -> &dyn ProfileRepository {
        self.profile_repo.as_ref()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .finish()
    }
}

/// Builder for creating a ServiceContext from individual repositories
#[derive(Default)]
pub struct ServiceContextBuilder {
    room_repo: Option<Arc<dyn RoomRepository>>,
    member_repo: Option<Arc<dyn MemberRepository>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    dm_request_repo: Option<Arc<dyn DmRequestRepository>>,
    profile_repo: Option<Arc<dyn ProfileRepository>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_repo(mut self, repo: Arc<dyn RoomRepository>) -> Self {
        self.room_repo = Some(repo);
        self
    }

    pub fn member_repo(mut self, repo: Arc<dyn MemberRepository>) -> Self {
        self.member_repo = Some(repo);
        self
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn dm_request_repo(mut self, repo: Arc<dyn DmRequestRepository>) -> Self {
        self.dm_request_repo = Some(repo);
        self
    }

    pub fn profile_repo(mut self, repo: Arc<dyn ProfileRepository>) -> Self {
        self.profile_repo = Some(repo);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Internal` if any repository is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.room_repo.ok_or_else(|| ServiceError::internal("room_repo is required"))?,
            self.member_repo.ok_or_else(|| ServiceError::internal("member_repo is required"))?,
            self.message_repo.ok_or_else(|| ServiceError::internal("message_repo is required"))?,
            self.dm_request_repo.ok_or_else(|| ServiceError::internal("dm_request_repo is required"))?,
            self.profile_repo.ok_or_else(|| ServiceError::internal("profile_repo is required"))?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_every_repo() {
        let store = Arc::new(MemoryChatStore::new());
        let err = ServiceContextBuilder::new()
            .room_repo(store.clone())
            .member_repo(store.clone())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("message_repo"));

        let ctx = ServiceContextBuilder::new()
            .room_repo(store.clone())
            .member_repo(store.clone())
            .message_repo(store.clone())
            .dm_request_repo(store.clone())
            .profile_repo(store)
            .build();
        assert!(ctx.is_ok());
    }
}
