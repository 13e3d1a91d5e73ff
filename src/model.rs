use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};

/// Backend-assigned conversation identifier.
///
/// The backend hands these out as integers today, but the client treats
/// them as opaque and accepts either a number or a string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ConversationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => ConversationId(n.to_string()),
            RawId::Text(s) => ConversationId(s),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
}

impl Conversation {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ConversationId::new(id),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Whether the backend has acknowledged a message.
///
/// Only optimistic user messages are ever `Pending` or `Failed`; anything
/// that came from the backend is `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Confirmed,
    Pending,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub status: DeliveryStatus,
    pub received_at: DateTime<Local>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_status(Role::User, text, DeliveryStatus::Confirmed)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_status(Role::Assistant, text, DeliveryStatus::Confirmed)
    }

    pub fn pending_user(text: impl Into<String>) -> Self {
        Self::with_status(Role::User, text, DeliveryStatus::Pending)
    }

    fn with_status(role: Role, text: impl Into<String>, status: DeliveryStatus) -> Self {
        Self {
            role,
            text: text.into(),
            status,
            received_at: Local::now(),
        }
    }
}

// Timestamps are display-only and never take part in equality.
impl PartialEq for ChatMessage {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.text == other.text && self.status == other.status
    }
}

/// Reply to `POST handle-message/`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageReply {
    pub response: String,
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub title: Option<String>,
}

/// Reply to `POST create-conversation/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedConversation {
    pub conversation_id: ConversationId,
    pub response: String,
    #[serde(default)]
    pub title: Option<String>,
}
