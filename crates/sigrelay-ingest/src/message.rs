//! Telegram Bot API wire types and the normalized chat event.
//!
//! Only the fields ingestion needs are modelled; everything else in an
//! update is ignored by serde.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope around every Bot API response.
///
/// Format: `{"ok": true, "result": ...}` or
/// `{"ok": false, "error_code": 401, "description": "Unauthorized"}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Result of `getMe`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// One entry of a `getUpdates` result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<ChatMessage>,
}

impl Update {
    /// Normalize into a chat event. Updates of other kinds (edits,
    /// callbacks, membership changes) yield `None`.
    pub fn into_event(self) -> Option<ChatEvent> {
        let (kind, msg) = match (self.message, self.channel_post) {
            (Some(msg), _) => (EventKind::Message, msg),
            (None, Some(msg)) => (EventKind::ChannelPost, msg),
            (None, None) => return None,
        };
        Some(ChatEvent {
            kind,
            chat_id: msg.chat.id.to_string(),
            user_id: msg.from.map(|u| u.id.to_string()),
            text: msg.text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub message_id: i64,
    pub chat: Chat,
    /// Absent for channel posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    /// Absent for media without caption, stickers, service messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
}

/// Kind of inbound chat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message,
    ChannelPost,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Message, EventKind::ChannelPost];

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::ChannelPost => "channel_post",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport-independent inbound chat event.
///
/// Identifiers are kept as strings so that the target comparison is a
/// plain string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub kind: EventKind,
    pub chat_id: String,
    pub user_id: Option<String>,
    pub text: Option<String>,
}

impl ChatEvent {
    /// Text event of the given kind.
    pub fn text(kind: EventKind, chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            chat_id: chat_id.into(),
            user_id: None,
            text: Some(text.into()),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get_updates_response() {
        let raw = r#"{
            "ok": true,
            "result": [
                {
                    "update_id": 10,
                    "message": {
                        "message_id": 1,
                        "date": 1700000000,
                        "chat": {"id": -1001234, "type": "supergroup", "title": "signals"},
                        "from": {"id": 42, "is_bot": false, "first_name": "Ana"},
                        "text": "BTC long"
                    }
                },
                {
                    "update_id": 11,
                    "channel_post": {
                        "message_id": 2,
                        "date": 1700000001,
                        "chat": {"id": -1005678, "type": "channel"},
                        "text": "ETH short"
                    }
                },
                {
                    "update_id": 12,
                    "edited_message": {
                        "message_id": 1,
                        "date": 1700000002,
                        "chat": {"id": -1001234, "type": "supergroup"},
                        "text": "BTC long (edit)"
                    }
                }
            ]
        }"#;

        let resp: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(resp.ok);
        let updates = resp.result.unwrap();
        assert_eq!(updates.len(), 3);

        let events: Vec<_> = updates.into_iter().filter_map(Update::into_event).collect();
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].kind, EventKind::Message);
        assert_eq!(events[0].chat_id, "-1001234");
        assert_eq!(events[0].user_id.as_deref(), Some("42"));
        assert_eq!(events[0].text.as_deref(), Some("BTC long"));

        assert_eq!(events[1].kind, EventKind::ChannelPost);
        assert_eq!(events[1].user_id, None);
    }

    #[test]
    fn test_parse_error_response() {
        let raw = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let resp: ApiResponse<BotUser> = serde_json::from_str(raw).unwrap();
        assert!(!resp.ok);
        assert!(resp.result.is_none());
        assert_eq!(resp.error_code, Some(401));
        assert_eq!(resp.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_media_message_has_no_text() {
        let raw = r#"{
            "update_id": 5,
            "message": {
                "message_id": 9,
                "chat": {"id": 7, "type": "private"},
                "photo": [{"file_id": "abc"}]
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let event = update.into_event().unwrap();
        assert_eq!(event.text, None);
    }
}
