//! Message entity - represents a chat message

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MessageId, ParticipantId, RoomId};

/// Maximum characters kept in a reply preview
pub const REPLY_PREVIEW_CHARS: usize = 100;

/// Maximum characters of content quoted in a room preview
pub const ROOM_PREVIEW_CONTENT_CHARS: usize = 150;

/// Maximum characters of a room preview line
pub const ROOM_PREVIEW_CHARS: usize = 200;

/// Snapshot of the message being replied to, taken at send time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPreview {
    pub message_id: MessageId,
    pub sender_nickname: String,
    pub content_preview: String,
}

/// Message entity
///
/// Sender nickname and avatar are copied from the sender's chat profile when
/// the message is created so history renders without profile lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: ParticipantId,
    pub sender_nickname: String,
    pub sender_avatar_url: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub reply_to: Option<ReplyPreview>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl Message {
    /// Create a new message with a fresh id
    ///
    /// The timestamp is truncated to microseconds, the precision the store keeps.
    pub fn new(
        room_id: RoomId,
        sender_id: ParticipantId,
        sender_nickname: String,
        content: Option<String>,
        image_url: Option<String>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            room_id,
            sender_id,
            sender_nickname,
            sender_avatar_url: None,
            content,
            image_url,
            reply_to: None,
            created_at: Utc::now().trunc_subsecs(6),
            deleted: false,
        }
    }

    /// Attach the sender's avatar
    pub fn with_avatar(mut self, avatar_url: Option<String>) -> Self {
        self.sender_avatar_url = avatar_url;
        self
    }

    /// Attach a reply preview
    pub fn with_reply(mut self, reply_to: Option<ReplyPreview>) -> Self {
        self.reply_to = reply_to;
        self
    }

    /// Check if message is a reply
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    /// Check if message has neither text nor image
    pub fn is_empty(&self) -> bool {
        let no_text = self.content.as_deref().map_or(true, |c| c.trim().is_empty());
        no_text && self.image_url.is_none()
    }

    /// Preview used when another message replies to this one
    pub fn reply_preview(&self) -> ReplyPreview {
        let text = self.content.as_deref().unwrap_or("[Image]");
        ReplyPreview {
            message_id: self.id,
            sender_nickname: self.sender_nickname.clone(),
            content_preview: truncate_chars(text, REPLY_PREVIEW_CHARS).to_string(),
        }
    }

    /// Sidebar preview line for the room this message was posted in
    pub fn room_preview(&self) -> String {
        let line = match self.content.as_deref() {
            Some(content) if !content.is_empty() => format!(
                "{}: {}",
                self.sender_nickname,
                truncate_chars(content, ROOM_PREVIEW_CONTENT_CHARS)
            ),
            _ => format!("{} sent an image", self.sender_nickname),
        };
        truncate_chars(&line, ROOM_PREVIEW_CHARS).to_string()
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: Option<&str>, image: Option<&str>) -> Message {
        Message::new(
            RoomId::new(42),
            ParticipantId::new(1),
            "Ash".to_string(),
            content.map(str::to_string),
            image.map(str::to_string),
        )
    }

    #[test]
    fn test_message_creation() {
        let msg = message(Some("hello"), None);
        assert!(!msg.is_reply());
        assert!(!msg.is_empty());
        assert!(!msg.deleted);
        assert_eq!(msg.created_at.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_is_empty() {
        assert!(message(Some("   "), None).is_empty());
        assert!(message(None, None).is_empty());
        assert!(!message(None, Some("https://img.example/a.png")).is_empty());
    }

    #[test]
    fn test_reply_preview() {
        let long = "x".repeat(300);
        let preview = message(Some(&long), None).reply_preview();
        assert_eq!(preview.content_preview.chars().count(), REPLY_PREVIEW_CHARS);
        assert_eq!(preview.sender_nickname, "Ash");

        let image_only = message(None, Some("https://img.example/a.png")).reply_preview();
        assert_eq!(image_only.content_preview, "[Image]");
    }

    #[test]
    fn test_room_preview() {
        assert_eq!(message(Some("hello"), None).room_preview(), "Ash: hello");
        assert_eq!(
            message(None, Some("https://img.example/a.png")).room_preview(),
            "Ash sent an image"
        );

        let long = "y".repeat(400);
        let preview = message(Some(&long), None).room_preview();
        assert_eq!(preview.chars().count(), "Ash: ".len() + ROOM_PREVIEW_CONTENT_CHARS);
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("🌙🌅", 1), "🌙");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
