//! Chat Message Data Structure
//!
//! Represents a direct message between two users, together with its
//! lifecycle fields (delivery, seen, reactions, soft delete).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text; `content` is the text itself
    #[default]
    Text,
    /// Voice note; `content` is a payload id
    Voice,
    /// Image; `content` is a payload id
    Image,
}

impl MessageKind {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Voice => "voice",
            MessageKind::Image => "image",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageKind::Text),
            "voice" => Some(MessageKind::Voice),
            "image" => Some(MessageKind::Image),
            _ => None,
        }
    }

    /// Whether `content` refers to an out-of-band binary payload
    pub fn carries_payload(&self) -> bool {
        matches!(self, MessageKind::Voice | MessageKind::Image)
    }
}

/// A single emoji reaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    pub user_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message ID (UUIDv7, never reused)
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    #[serde(default)]
    pub kind: MessageKind,
    /// Text body, or payload id for voice/image messages
    pub content: String,
    /// Voice note length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub seen_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    /// Original message this one was forwarded from
    pub forwarded_from: Option<Uuid>,
    #[serde(default)]
    pub deleted: bool,
}

impl Message {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

/// Input for creating a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub kind: MessageKind,
    pub content: String,
    pub duration_ms: Option<u32>,
    pub forwarded_from: Option<Uuid>,
}

impl NewMessage {
    pub fn text(sender_id: Uuid, receiver_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            sender_id,
            receiver_id,
            kind: MessageKind::Text,
            content: content.into(),
            duration_ms: None,
            forwarded_from: None,
        }
    }

    /// Copy of `original` addressed from `sender_id` to `receiver_id`
    pub fn forward_of(original: &Message, sender_id: Uuid, receiver_id: Uuid) -> Self {
        Self {
            sender_id,
            receiver_id,
            kind: original.kind,
            content: original.content.clone(),
            duration_ms: original.duration_ms,
            forwarded_from: Some(original.id),
        }
    }
}

/// Acknowledgement of a seen message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeenReceipt {
    pub message_id: Uuid,
    pub sender_id: Uuid,
    pub seen_at: DateTime<Utc>,
}

/// Page size used when a history query names none
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Largest page a history query may ask for
pub const MAX_HISTORY_LIMIT: u32 = 200;

/// Query parameters for a page of chat history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl HistoryQuery {
    /// Fill in `limit` when the client left it out
    pub fn with_default_limit(self, limit: u32) -> Self {
        Self {
            limit: self.limit.or(Some(limit)),
            ..self
        }
    }

    /// Requested page size, clamped to `1..=MAX_HISTORY_LIMIT`
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT) as usize
    }

    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0) as usize
    }
}

/// One page of chat history, ascending by time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub messages: Vec<Message>,
    pub has_more: bool,
}
