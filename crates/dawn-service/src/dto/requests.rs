//! Request DTOs
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use dawn_core::{MessageId, ParticipantId, RoomType};
use serde::Deserialize;
use validator::Validate;

/// Maximum characters in a message body
pub const CONTENT_MAX_CHARS: usize = 2000;

// ============================================================================
// Message Requests
// ============================================================================

/// Send a message to a room
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Length is checked by the message service, which reports `CONTENT_TOO_LONG`
    pub content: Option<String>,

    #[validate(length(min = 1, max = 2048, message = "Image URL must be 1-2048 characters"))]
    pub image_url: Option<String>,

    pub reply_to_id: Option<MessageId>,
}

impl SendMessageRequest {
    /// Text-only message
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// Post a message as the system sender
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Message content must be 1-2000 characters"))]
    pub content: String,

    /// Display name shown as the sender; "Unknown" when absent
    #[validate(length(min = 1, max = 32, message = "Sender name must be 1-32 characters"))]
    pub sender_name: Option<String>,
}

// ============================================================================
// Room Requests
// ============================================================================

/// Create a group room owned by the requester
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Group name must be 1-100 characters"))]
    pub name: String,

    /// Other participants to add; the creator is added as admin automatically
    #[serde(default)]
    pub member_ids: Vec<ParticipantId>,
}

/// Administrative room creation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 100, message = "Room name must be 1-100 characters"))]
    pub name: String,

    /// `group` unless stated; a `dm` needs exactly two distinct members
    #[serde(default, alias = "type")]
    pub room_type: RoomType,

    #[validate(length(min = 1, message = "A room needs at least one member"))]
    pub member_ids: Vec<ParticipantId>,
}

/// Set or clear a room's icon
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoomIconRequest {
    /// Empty string removes the icon
    #[validate(length(max = 2048, message = "Icon URL must be at most 2048 characters"))]
    pub icon_url: String,
}

// ============================================================================
// DM Requests
// ============================================================================

/// Ask another participant to open a DM room
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDmRequest {
    pub to_participant_id: ParticipantId,

    #[validate(length(max = 500, message = "Request message must be at most 500 characters"))]
    pub message: Option<String>,
}

// ============================================================================
// Profile Requests
// ============================================================================

/// Change nickname and/or avatar
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 32, message = "Nickname must be 1-32 characters"))]
    pub nickname: Option<String>,

    /// Empty string removes the avatar
    #[validate(length(max = 2048, message = "Avatar URL must be at most 2048 characters"))]
    pub avatar_url: Option<String>,
}
