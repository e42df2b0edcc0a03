//! Room service
//!
//! Room lifecycle, membership, and read state.

use dawn_core::entities::{
    MemberRole, NewRoom, Room, RoomMember, RoomMemberInfo, RoomSummary, RoomType, RoomWithMembers,
};
use dawn_core::{DomainError, ParticipantId, RoomId};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{CreateGroupRequest, CreateRoomRequest, UpdateRoomIconRequest};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Room service
pub struct RoomService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RoomService<'a> {
    /// Create a new RoomService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Rooms the participant belongs to, most recent activity first, with unread counts
    #[instrument(skip(self))]
    pub async fn list_rooms(&self, participant_id: ParticipantId) -> ServiceResult<Vec<RoomSummary>> {
        Ok(self.ctx.room_repo().find_for_participant(participant_id).await?)
    }

    /// Get a room by id
    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: RoomId) -> ServiceResult<Room> {
        self.ctx
            .room_repo()
            .find_by_id(room_id)
            .await?
            .ok_or_else(|| DomainError::RoomNotFound(room_id).into())
    }

    /// Members of a room with their nickname and avatar; the requester must be one of them
    #[instrument(skip(self))]
    pub async fn list_members(
        &self,
        room_id: RoomId,
        requester: ParticipantId,
    ) -> ServiceResult<Vec<RoomMemberInfo>> {
        self.require_member(room_id, requester).await?;
        self.member_infos(room_id).await
    }

    /// Set or clear the room icon
    #[instrument(skip(self, request))]
    pub async fn update_room_icon(
        &self,
        room_id: RoomId,
        request: UpdateRoomIconRequest,
    ) -> ServiceResult<Room> {
        request.validate()?;

        let icon_url = Some(request.icon_url.trim()).filter(|url| !url.is_empty());
        let room = self.ctx.room_repo().update_icon(room_id, icon_url).await?;

        info!(room_id = %room_id, cleared = icon_url.is_none(), "Room icon updated");
        Ok(room)
    }

    /// Create a group room; the creator becomes its admin
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_group(
        &self,
        creator: ParticipantId,
        request: CreateGroupRequest,
    ) -> ServiceResult<Room> {
        request.validate()?;

        let mut members = vec![(creator, MemberRole::Admin)];
        for participant_id in request.member_ids {
            if !members.iter().any(|(existing, _)| *existing == participant_id) {
                members.push((participant_id, MemberRole::Member));
            }
        }

        let room = self
            .ctx
            .room_repo()
            .create_with_members(&NewRoom::group(request.name.trim(), Some(creator)), &members)
            .await?;

        info!(room_id = %room.id, creator = %creator, members = members.len(), "Group room created");
        Ok(room)
    }

    /// Add a participant to a group room
    #[instrument(skip(self))]
    pub async fn add_member(
        &self,
        room_id: RoomId,
        participant_id: ParticipantId,
    ) -> ServiceResult<RoomMember> {
        let room = self.get_room(room_id).await?;
        if room.is_dm() {
            return Err(DomainError::ValidationError(
                "members cannot be added to a direct message room".to_string(),
            )
            .into());
        }

        let member = self
            .ctx
            .member_repo()
            .add(room_id, participant_id, MemberRole::Member)
            .await?;

        info!(room_id = %room_id, participant_id = %participant_id, "Member added");
        Ok(member)
    }

    /// Remove a participant from a room; returns false if they were not a member
    #[instrument(skip(self))]
    pub async fn remove_member(&self, room_id: RoomId, participant_id: ParticipantId) -> ServiceResult<bool> {
        let removed = self.ctx.member_repo().remove(room_id, participant_id).await?;
        if removed {
            info!(room_id = %room_id, participant_id = %participant_id, "Member removed");
        }
        Ok(removed)
    }

    /// Check membership
    pub async fn is_member(&self, room_id: RoomId, participant_id: ParticipantId) -> ServiceResult<bool> {
        Ok(self.ctx.member_repo().is_member(room_id, participant_id).await?)
    }

    /// Fail with `NotRoomMember` unless the participant belongs to the room
    pub async fn require_member(&self, room_id: RoomId, participant_id: ParticipantId) -> ServiceResult<()> {
        if self.is_member(room_id, participant_id).await? {
            Ok(())
        } else {
            Err(DomainError::NotRoomMember.into())
        }
    }

    /// Mark everything in the room read for the participant
    #[instrument(skip(self))]
    pub async fn mark_read(&self, room_id: RoomId, participant_id: ParticipantId) -> ServiceResult<()> {
        self.ctx.member_repo().mark_read(room_id, participant_id).await?;
        Ok(())
    }

    // === Administration ===

    /// Create a room of either type with the given members and no owner
    #[instrument(skip(self, request), fields(name = %request.name, room_type = request.room_type.as_str()))]
    pub async fn admin_create_room(&self, request: CreateRoomRequest) -> ServiceResult<Room> {
        request.validate()?;

        let mut members: Vec<(ParticipantId, MemberRole)> = Vec::with_capacity(request.member_ids.len());
        for participant_id in request.member_ids {
            if !members.iter().any(|(existing, _)| *existing == participant_id) {
                members.push((participant_id, MemberRole::Member));
            }
        }

        if request.room_type == RoomType::Dm && members.len() != 2 {
            return Err(DomainError::ValidationError(
                "a direct message room needs exactly two members".to_string(),
            )
            .into());
        }

        let room = self
            .ctx
            .room_repo()
            .create_with_members(&NewRoom::named(request.name.trim(), request.room_type), &members)
            .await?;

        info!(room_id = %room.id, "Room created by administrator");
        Ok(room)
    }

    /// Delete a room with all its members and messages
    #[instrument(skip(self))]
    pub async fn admin_delete_room(&self, room_id: RoomId) -> ServiceResult<()> {
        if !self.ctx.room_repo().delete(room_id).await? {
            return Err(DomainError::RoomNotFound(room_id).into());
        }
        info!(room_id = %room_id, "Room deleted by administrator");
        Ok(())
    }

    /// Every room on the platform with its members
    pub async fn list_all_rooms(&self) -> ServiceResult<Vec<RoomWithMembers>> {
        let rooms = self.ctx.room_repo().find_all().await?;

        let mut enriched = Vec::with_capacity(rooms.len());
        for room in rooms {
            let members = self.member_infos(room.id).await?;
            enriched.push(RoomWithMembers { room, members });
        }
        Ok(enriched)
    }

    async fn member_infos(&self, room_id: RoomId) -> ServiceResult<Vec<RoomMemberInfo>> {
        let members: Vec<RoomMember> = self.ctx.member_repo().find_by_room(room_id).await?;

        let mut infos = Vec::with_capacity(members.len());
        for member in &members {
            let profile = self.ctx.profile_repo().find(member.participant_id).await?;
            infos.push(RoomMemberInfo::new(member, profile.as_ref()));
        }
        Ok(infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dawn_db::MemoryChatStore;

    use crate::dto::UpdateProfileRequest;
    use crate::services::{ProfileService, ServiceError};

    fn ctx() -> ServiceContext {
        ServiceContext::in_memory(Arc::new(MemoryChatStore::new()))
    }

    fn p(id: i64) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn group(name: &str, members: &[i64]) -> CreateGroupRequest {
        CreateGroupRequest {
            name: name.to_string(),
            member_ids: members.iter().copied().map(ParticipantId::new).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_group_roles_and_dedup() {
        let ctx = ctx();
        let service = RoomService::new(&ctx);

        let room = service
            .create_group(p(1), group("  Night Owls ", &[2, 2, 1, 3]))
            .await
            .unwrap();
        assert_eq!(room.name.as_deref(), Some("Night Owls"));
        assert_eq!(room.created_by, Some(p(1)));

        let members = service.list_members(room.id, p(1)).await.unwrap();
        assert_eq!(members.len(), 3);
        let creator = members.iter().find(|m| m.participant_id == p(1)).unwrap();
        assert_eq!(creator.role, MemberRole::Admin);
        assert!(members
            .iter()
            .filter(|m| m.participant_id != p(1))
            .all(|m| m.role == MemberRole::Member));
    }

    #[tokio::test]
    async fn test_create_group_validates_name() {
        let ctx = ctx();
        let service = RoomService::new(&ctx);
        let err = service.create_group(p(1), group("", &[])).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_list_members_requires_membership() {
        let ctx = ctx();
        let service = RoomService::new(&ctx);
        let room = service.create_group(p(1), group("g", &[])).await.unwrap();

        let err = service.list_members(room.id, p(2)).await.unwrap_err();
        assert!(err.is_authorization());
    }

    #[tokio::test]
    async fn test_add_and_remove_member() {
        let ctx = ctx();
        let service = RoomService::new(&ctx);
        let room = service.create_group(p(1), group("g", &[])).await.unwrap();

        service.add_member(room.id, p(2)).await.unwrap();
        assert!(service.is_member(room.id, p(2)).await.unwrap());

        let err = service.add_member(room.id, p(2)).await.unwrap_err();
        assert!(err.is_conflict());

        assert!(service.remove_member(room.id, p(2)).await.unwrap());
        assert!(!service.remove_member(room.id, p(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_member_to_missing_room() {
        let ctx = ctx();
        let service = RoomService::new(&ctx);
        let err = service.add_member(RoomId::new(404), p(2)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_admin_room_lifecycle() {
        let ctx = ctx();
        let service = RoomService::new(&ctx);

        let room = service
            .admin_create_room(CreateRoomRequest {
                name: "Announcements".to_string(),
                room_type: RoomType::Group,
                member_ids: vec![p(1), p(2)],
            })
            .await
            .unwrap();
        assert!(room.created_by.is_none());
        assert!(!room.is_dm());
        assert_eq!(service.list_all_rooms().await.unwrap().len(), 1);
        assert_eq!(service.list_rooms(p(2)).await.unwrap().len(), 1);

        service.admin_delete_room(room.id).await.unwrap();
        assert!(service.list_all_rooms().await.unwrap().is_empty());
        assert!(!service.is_member(room.id, p(1)).await.unwrap());

        let err = service.admin_delete_room(room.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_admin_create_dm_room() {
        let ctx = ctx();
        let service = RoomService::new(&ctx);

        let dm = service
            .admin_create_room(CreateRoomRequest {
                name: "Support".to_string(),
                room_type: RoomType::Dm,
                member_ids: vec![p(1), p(2), p(1)],
            })
            .await
            .unwrap();
        assert!(dm.is_dm());
        assert!(service.is_member(dm.id, p(2)).await.unwrap());

        let err = service
            .admin_create_room(CreateRoomRequest {
                name: "Crowd".to_string(),
                room_type: RoomType::Dm,
                member_ids: vec![p(1), p(2), p(3)],
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_members_carry_profile_or_unknown() {
        let ctx = ctx();
        let service = RoomService::new(&ctx);
        let room = service.create_group(p(1), group("g", &[2])).await.unwrap();

        ProfileService::new(&ctx)
            .update(
                p(1),
                UpdateProfileRequest {
                    nickname: Some("Misty".to_string()),
                    avatar_url: Some("https://img.example/misty.png".to_string()),
                },
            )
            .await
            .unwrap();

        let members = service.list_members(room.id, p(1)).await.unwrap();
        let misty = members.iter().find(|m| m.participant_id == p(1)).unwrap();
        assert_eq!(misty.nickname, "Misty");
        assert_eq!(misty.avatar_url.as_deref(), Some("https://img.example/misty.png"));

        // Participant 2 never connected, so has no profile yet
        let stranger = members.iter().find(|m| m.participant_id == p(2)).unwrap();
        assert_eq!(stranger.nickname, "Unknown");
        assert!(stranger.avatar_url.is_none());

        let all = service.list_all_rooms().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].room.id, room.id);
        assert_eq!(all[0].members, members);
    }

    #[tokio::test]
    async fn test_update_room_icon() {
        let ctx = ctx();
        let service = RoomService::new(&ctx);
        let room = service.create_group(p(1), group("g", &[])).await.unwrap();

        let updated = service
            .update_room_icon(
                room.id,
                UpdateRoomIconRequest {
                    icon_url: " https://img.example/owl.png ".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.icon_url.as_deref(), Some("https://img.example/owl.png"));

        let cleared = service
            .update_room_icon(room.id, UpdateRoomIconRequest { icon_url: String::new() })
            .await
            .unwrap();
        assert!(cleared.icon_url.is_none());

        let err = service
            .update_room_icon(RoomId::new(404), UpdateRoomIconRequest { icon_url: String::new() })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
