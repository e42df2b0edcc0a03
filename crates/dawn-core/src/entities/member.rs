//! Member entity - a participant's membership in a room

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::ChatProfile;
use crate::value_objects::{ParticipantId, RoomId};

/// Member role within a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Admin,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    /// Parse the database representation; `owner` rows from older data map to admin
    pub fn from_db(value: &str) -> Self {
        match value {
            "admin" | "owner" => Self::Admin,
            _ => Self::Member,
        }
    }
}

/// Room member (junction between Room and participant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomMember {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
}

impl RoomMember {
    /// Create a new member record
    pub fn new(room_id: RoomId, participant_id: ParticipantId, role: MemberRole) -> Self {
        Self {
            room_id,
            participant_id,
            role,
            joined_at: Utc::now(),
            last_read_at: None,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }

    /// Check whether a message created at `at` is unread for this member
    pub fn is_unread(&self, at: DateTime<Utc>) -> bool {
        self.last_read_at.map_or(true, |read| at > read)
    }
}

/// Nickname shown for a member with no chat profile
pub const UNKNOWN_NICKNAME: &str = "Unknown";

/// Member joined with their chat profile for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomMemberInfo {
    pub participant_id: ParticipantId,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub role: MemberRole,
}

impl RoomMemberInfo {
    /// Combine a membership row with the member's profile, if they have one
    pub fn new(member: &RoomMember, profile: Option<&ChatProfile>) -> Self {
        Self {
            participant_id: member.participant_id,
            nickname: profile
                .map(|p| p.nickname.clone())
                .unwrap_or_else(|| UNKNOWN_NICKNAME.to_string()),
            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
            role: member.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_role_from_db() {
        assert_eq!(MemberRole::from_db("owner"), MemberRole::Admin);
        assert_eq!(MemberRole::from_db("admin"), MemberRole::Admin);
        assert_eq!(MemberRole::from_db("member"), MemberRole::Member);
    }

    #[test]
    fn test_is_unread() {
        let mut member = RoomMember::new(RoomId::new(1), ParticipantId::new(2), MemberRole::Member);
        let now = Utc::now();
        assert!(member.is_unread(now));

        member.last_read_at = Some(now);
        assert!(!member.is_unread(now - Duration::seconds(1)));
        assert!(member.is_unread(now + Duration::seconds(1)));
    }

    #[test]
    fn test_member_info_falls_back_without_profile() {
        let member = RoomMember::new(RoomId::new(1), ParticipantId::new(2), MemberRole::Admin);
        let info = RoomMemberInfo::new(&member, None);
        assert_eq!(info.nickname, "Unknown");
        assert!(info.avatar_url.is_none());
        assert_eq!(info.role, MemberRole::Admin);

        let mut profile = ChatProfile::new(ParticipantId::new(2), "Brock".to_string());
        profile.avatar_url = Some("https://img.example/brock.png".to_string());
        let info = RoomMemberInfo::new(&member, Some(&profile));
        assert_eq!(info.nickname, "Brock");
        assert_eq!(info.avatar_url.as_deref(), Some("https://img.example/brock.png"));
    }
}
