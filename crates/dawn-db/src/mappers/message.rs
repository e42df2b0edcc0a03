//! Message entity <-> model mapper

use dawn_core::entities::{Message, ReplyPreview};
use dawn_core::value_objects::{MessageId, ParticipantId, RoomId};
use uuid::Uuid;

use crate::models::MessageModel;

impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        let reply_to = model.reply_to_id.map(|id| ReplyPreview {
            message_id: MessageId::from_uuid(id),
            sender_nickname: model.reply_sender_nickname.unwrap_or_default(),
            content_preview: model.reply_content_preview.unwrap_or_default(),
        });

        Message {
            id: MessageId::from_uuid(model.id),
            room_id: RoomId::new(model.room_id),
            sender_id: ParticipantId::new(model.sender_id),
            sender_nickname: model.sender_nickname,
            sender_avatar_url: model.sender_avatar_url,
            content: model.content,
            image_url: model.image_url,
            reply_to,
            created_at: model.created_at,
            deleted: model.deleted,
        }
    }
}

/// Message flattened into column values for insertion
pub struct MessageInsert<'a> {
    pub id: Uuid,
    pub room_id: i64,
    pub sender_id: i64,
    pub sender_nickname: &'a str,
    pub sender_avatar_url: Option<&'a str>,
    pub content: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub reply_to_id: Option<Uuid>,
    pub reply_sender_nickname: Option<&'a str>,
    pub reply_content_preview: Option<&'a str>,
}

impl<'a> MessageInsert<'a> {
    pub fn new(message: &'a Message) -> Self {
        let reply = message.reply_to.as_ref();
        Self {
            id: message.id.into_uuid(),
            room_id: message.room_id.into_inner(),
            sender_id: message.sender_id.into_inner(),
            sender_nickname: &message.sender_nickname,
            sender_avatar_url: message.sender_avatar_url.as_deref(),
            content: message.content.as_deref(),
            image_url: message.image_url.as_deref(),
            reply_to_id: reply.map(|r| r.message_id.into_uuid()),
            reply_sender_nickname: reply.map(|r| r.sender_nickname.as_str()),
            reply_content_preview: reply.map(|r| r.content_preview.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_reply_columns_roundtrip() {
        let original = Message::new(
            RoomId::new(1),
            ParticipantId::new(2),
            "Ash".to_string(),
            Some("first".to_string()),
            None,
        );
        let reply = Message::new(
            RoomId::new(1),
            ParticipantId::new(3),
            "Misty".to_string(),
            Some("second".to_string()),
            None,
        )
        .with_reply(Some(original.reply_preview()));

        let insert = MessageInsert::new(&reply);
        let model = MessageModel {
            id: insert.id,
            room_id: insert.room_id,
            sender_id: insert.sender_id,
            sender_nickname: insert.sender_nickname.to_string(),
            sender_avatar_url: None,
            content: insert.content.map(str::to_string),
            image_url: None,
            reply_to_id: insert.reply_to_id,
            reply_sender_nickname: insert.reply_sender_nickname.map(str::to_string),
            reply_content_preview: insert.reply_content_preview.map(str::to_string),
            created_at: reply.created_at,
            deleted: false,
        };
        assert!(model.is_reply());

        let restored = Message::from(model);
        assert_eq!(restored, reply);
        assert!(restored.created_at <= Utc::now());
    }
}
