//! Room database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for chat_rooms table
#[derive(Debug, Clone, FromRow)]
pub struct RoomModel {
    pub id: i64,
    pub name: Option<String>,
    pub room_type: String,
    pub created_by: Option<i64>,
    pub icon_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_preview: Option<String>,
}

/// Room row joined with the caller's unread count
#[derive(Debug, Clone, FromRow)]
pub struct RoomSummaryModel {
    #[sqlx(flatten)]
    pub room: RoomModel,
    pub unread_count: i64,
}
