//! Chat profile service
//!
//! Nicknames and avatars participants use inside chat.

use chrono::{DateTime, Utc};
use dawn_core::entities::{truncate_chars, ChatProfile, NICKNAME_MAX_CHARS};
use dawn_core::{DomainError, ParticipantId};
use tracing::{debug, instrument};
use validator::Validate;

use crate::dto::UpdateProfileRequest;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Profile service
pub struct ProfileService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProfileService<'a> {
    /// Create a new ProfileService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Get a participant's profile
    #[instrument(skip(self))]
    pub async fn get(&self, participant_id: ParticipantId) -> ServiceResult<Option<ChatProfile>> {
        Ok(self.ctx.profile_repo().find(participant_id).await?)
    }

    /// Get the profile, creating it on first use
    ///
    /// A new profile takes `display_name` (trimmed, cut to the nickname limit),
    /// falling back to `Trainer {id}`. Existing profiles are never overwritten.
    #[instrument(skip(self))]
    pub async fn get_or_create(
        &self,
        participant_id: ParticipantId,
        display_name: Option<&str>,
    ) -> ServiceResult<ChatProfile> {
        if let Some(profile) = self.ctx.profile_repo().find(participant_id).await? {
            return Ok(profile);
        }

        let nickname = display_name
            .map(|name| truncate_chars(name.trim(), NICKNAME_MAX_CHARS).trim_end())
            .filter(|name| !name.is_empty())
            .map_or_else(|| ChatProfile::default_nickname(participant_id), str::to_string);

        let profile = self
            .ctx
            .profile_repo()
            .insert_if_absent(&ChatProfile::new(participant_id, nickname))
            .await?;

        debug!(participant_id = %participant_id, nickname = %profile.nickname, "Chat profile ready");
        Ok(profile)
    }

    /// Update nickname and/or avatar
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        participant_id: ParticipantId,
        request: UpdateProfileRequest,
    ) -> ServiceResult<ChatProfile> {
        request.validate()?;

        let mut profile = self.get_or_create(participant_id, None).await?;

        if let Some(nickname) = request.nickname {
            let nickname = nickname.trim();
            if nickname.is_empty() {
                return Err(DomainError::InvalidNickname("nickname cannot be blank".to_string()).into());
            }
            profile.nickname = nickname.to_string();
        }

        if let Some(avatar_url) = request.avatar_url {
            let avatar_url = avatar_url.trim();
            profile.avatar_url = (!avatar_url.is_empty()).then(|| avatar_url.to_string());
        }

        self.ctx.profile_repo().update(&profile).await?;
        profile.updated_at = Utc::now();
        Ok(profile)
    }

    /// Persist a last-seen timestamp; older values never overwrite newer ones
    pub async fn record_last_seen(
        &self,
        participant_id: ParticipantId,
        at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        self.ctx.profile_repo().record_last_seen(participant_id, at).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dawn_db::MemoryChatStore;

    use crate::services::ServiceError;

    fn ctx() -> ServiceContext {
        ServiceContext::in_memory(Arc::new(MemoryChatStore::new()))
    }

    #[tokio::test]
    async fn test_get_or_create_uses_display_name_once() {
        let ctx = ctx();
        let service = ProfileService::new(&ctx);
        let p = ParticipantId::new(5);

        let profile = service.get_or_create(p, Some("  Ash Ketchum  ")).await.unwrap();
        assert_eq!(profile.nickname, "Ash Ketchum");

        let again = service.get_or_create(p, Some("Someone Else")).await.unwrap();
        assert_eq!(again.nickname, "Ash Ketchum");
    }

    #[tokio::test]
    async fn test_get_or_create_fallback_nickname() {
        let ctx = ctx();
        let service = ProfileService::new(&ctx);

        let profile = service.get_or_create(ParticipantId::new(9), Some("   ")).await.unwrap();
        assert_eq!(profile.nickname, "Trainer 9");

        let long = "x".repeat(50);
        let profile = service.get_or_create(ParticipantId::new(10), Some(&long)).await.unwrap();
        assert_eq!(profile.nickname.chars().count(), NICKNAME_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let ctx = ctx();
        let service = ProfileService::new(&ctx);
        let p = ParticipantId::new(1);

        let updated = service
            .update(
                p,
                UpdateProfileRequest {
                    nickname: Some("Misty".into()),
                    avatar_url: Some("https://img.example/m.png".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nickname, "Misty");

        // empty avatar clears it
        let cleared = service
            .update(
                p,
                UpdateProfileRequest {
                    nickname: None,
                    avatar_url: Some(String::new()),
                },
            )
            .await
            .unwrap();
        assert!(cleared.avatar_url.is_none());
        assert_eq!(service.get(p).await.unwrap().unwrap().nickname, "Misty");
    }

    #[tokio::test]
    async fn test_update_rejects_blank_nickname() {
        let ctx = ctx();
        let service = ProfileService::new(&ctx);

        let err = service
            .update(
                ParticipantId::new(1),
                UpdateProfileRequest {
                    nickname: Some("   ".into()),
                    avatar_url: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidNickname(_))));
    }
}
