//! Member database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for chat_room_members table
#[derive(Debug, Clone, FromRow)]
pub struct RoomMemberModel {
    pub room_id: i64,
    pub participant_id: i64,
    pub role: String,
    pub joined_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
}
