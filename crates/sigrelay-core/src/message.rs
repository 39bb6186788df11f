//! Message records.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored text record: ingested from chat, posted over HTTP, or derived
/// from a trade signal.
///
/// Field names follow the `"Message"` table (`userId`, `chatId`, `createdAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Store-assigned identifier, increasing with insertion order.
    pub id: i64,
    pub text: String,
    /// Sending user (open capture only).
    pub user_id: Option<String>,
    /// Originating chat (open capture only).
    pub chat_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A message that has passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    text: String,
    user_id: Option<String>,
    chat_id: Option<String>,
}

impl NewMessage {
    /// Create an untagged message. Blank text is rejected.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(CoreError::EmptyText);
        }
        Ok(Self {
            text,
            user_id: None,
            chat_id: None,
        })
    }

    /// Create a message tagged with its sender and chat.
    pub fn tagged(
        text: impl Into<String>,
        user_id: Option<String>,
        chat_id: Option<String>,
    ) -> Result<Self> {
        let mut message = Self::new(text)?;
        message.user_id = user_id;
        message.chat_id = chat_id;
        Ok(message)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }
}
