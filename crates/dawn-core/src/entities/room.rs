//! Room entity - a chat channel, direct or group

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::RoomMemberInfo;
use crate::value_objects::{ParticipantId, RoomId};

/// Room type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    /// Direct message between two participants
    Dm,
    /// Named group chat
    #[default]
    Group,
}

impl RoomType {
    /// Database / wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dm => "dm",
            Self::Group => "group",
        }
    }

    /// Parse the database representation, treating unknown values as groups
    pub fn from_db(value: &str) -> Self {
        match value {
            "dm" => Self::Dm,
            _ => Self::Group,
        }
    }
}

/// Room entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: Option<String>,
    pub room_type: RoomType,
    pub created_by: Option<ParticipantId>,
    pub icon_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_preview: Option<String>,
}

impl Room {
    /// Check if this is a direct-message room
    #[inline]
    pub fn is_dm(&self) -> bool {
        self.room_type == RoomType::Dm
    }
}

/// Room attributes supplied at creation; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub name: Option<String>,
    pub room_type: RoomType,
    pub created_by: Option<ParticipantId>,
}

impl NewRoom {
    pub fn dm() -> Self {
        Self {
            name: None,
            room_type: RoomType::Dm,
            created_by: None,
        }
    }

    pub fn group(name: impl Into<String>, created_by: Option<ParticipantId>) -> Self {
        Self {
            name: Some(name.into()),
            room_type: RoomType::Group,
            created_by,
        }
    }

    /// Named room of either type with no owner
    pub fn named(name: impl Into<String>, room_type: RoomType) -> Self {
        Self {
            name: Some(name.into()),
            room_type,
            created_by: None,
        }
    }
}

/// Room as seen by one participant, with their unread count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    #[serde(flatten)]
    pub room: Room,
    pub unread_count: i64,
}

/// Administrative view of a room with its member list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomWithMembers {
    #[serde(flatten)]
    pub room: Room,
    pub members: Vec<RoomMemberInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_type_db_roundtrip() {
        assert_eq!(RoomType::from_db(RoomType::Dm.as_str()), RoomType::Dm);
        assert_eq!(RoomType::from_db(RoomType::Group.as_str()), RoomType::Group);
        assert_eq!(RoomType::from_db("faction"), RoomType::Group);
    }

    #[test]
    fn test_new_room_constructors() {
        let dm = NewRoom::dm();
        assert_eq!(dm.room_type, RoomType::Dm);
        assert!(dm.name.is_none());

        let group = NewRoom::group("Night Owls", Some(ParticipantId::new(3)));
        assert_eq!(group.room_type, RoomType::Group);
        assert_eq!(group.name.as_deref(), Some("Night Owls"));

        let dm = NewRoom::named("Support", RoomType::Dm);
        assert_eq!(dm.room_type, RoomType::Dm);
        assert!(dm.created_by.is_none());
        assert_eq!(RoomType::default(), RoomType::Group);
    }
}
