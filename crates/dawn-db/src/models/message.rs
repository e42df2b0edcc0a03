//! Message database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for chat_messages table
///
/// The reply preview is denormalized into three nullable columns.
#[derive(Debug, Clone, FromRow)]
pub struct MessageModel {
    pub id: Uuid,
    pub room_id: i64,
    pub sender_id: i64,
    pub sender_nickname: String,
    pub sender_avatar_url: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub reply_to_id: Option<Uuid>,
    pub reply_sender_nickname: Option<String>,
    pub reply_content_preview: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
}

impl MessageModel {
    /// Check if message is a reply
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reply_to_id.is_some()
    }
}
