/**
 * Real-time Event Contract
 *
 * This module defines the events exchanged over a messaging connection.
 * Every frame is a JSON object of the form:
 *
 * ```json
 * { "event": "sendMessage", "data": { "receiverId": "...", "kind": "text", "content": "hi" } }
 * ```
 *
 * Inbound frames decode into [`ClientEvent`], outbound frames are produced
 * from [`ServerEvent`]. Event names and field names are camelCase.
 *
 * The only frame outside this envelope is the handshake: a client that did
 * not present a token on the upgrade request sends `{"token": "..."}` as its
 * first frame, and a failed handshake is answered with [`AuthFailure`].
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::{ErrorKind, SharedError};
use crate::shared::messaging::{Message, MessageKind};

/// Event sent by a client over an authenticated connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    SendMessage {
        receiver_id: Uuid,
        #[serde(default)]
        kind: MessageKind,
        /// Text body for text messages
        #[serde(default)]
        content: Option<String>,
        /// Payload reference for voice/image messages
        #[serde(default)]
        payload_id: Option<String>,
        #[serde(default)]
        duration_ms: Option<u32>,
    },
    MarkMessagesAsSeen {
        counterpart_id: Uuid,
    },
    AddReaction {
        message_id: Uuid,
        emoji: String,
    },
    ForwardMessage {
        message_id: Uuid,
        receiver_ids: Vec<Uuid>,
    },
    DeleteMessage {
        message_id: Uuid,
    },
}

impl ClientEvent {
    /// Decode an inbound text frame
    pub fn decode(frame: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(frame)?)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::SendMessage { .. } => "sendMessage",
            ClientEvent::MarkMessagesAsSeen { .. } => "markMessagesAsSeen",
            ClientEvent::AddReaction { .. } => "addReaction",
            ClientEvent::ForwardMessage { .. } => "forwardMessage",
            ClientEvent::DeleteMessage { .. } => "deleteMessage",
        }
    }
}

/// Event pushed by the server to a user's connections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// A friend sent the receiver a message
    ReceiveMessage {
        message: Message,
    },
    /// Sender-side acknowledgement that the message was stored
    MessageAccepted {
        message: Message,
    },
    MessageDelivered {
        message_id: Uuid,
        delivered_at: DateTime<Utc>,
    },
    /// Out-of-band payload reference for a voice/image message
    MessagePayload {
        message_id: Uuid,
        payload_id: String,
        kind: MessageKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u32>,
    },
    MessageSeen {
        message_id: Uuid,
        seen_at: DateTime<Utc>,
    },
    ReactionAdded {
        message_id: Uuid,
        emoji: String,
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    MessageForwarded {
        forwarded_to: Vec<Uuid>,
        original_message_id: Uuid,
    },
    MessageDeleted {
        message_id: Uuid,
    },
    FriendRequestReceived {
        user_id: Uuid,
        username: String,
    },
    FriendRequestSent {
        user_id: Uuid,
        username: String,
    },
    FriendRequestAccepted {
        user_id: Uuid,
        username: String,
    },
    Error {
        kind: ErrorKind,
        reason: String,
    },
}

impl ServerEvent {
    pub fn error(kind: ErrorKind, reason: impl Into<String>) -> Self {
        ServerEvent::Error {
            kind,
            reason: reason.into(),
        }
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ReceiveMessage { .. } => "receiveMessage",
            ServerEvent::MessageAccepted { .. } => "messageAccepted",
            ServerEvent::MessageDelivered { .. } => "messageDelivered",
            ServerEvent::MessagePayload { .. } => "messagePayload",
            ServerEvent::MessageSeen { .. } => "messageSeen",
            ServerEvent::ReactionAdded { .. } => "reactionAdded",
            ServerEvent::MessageForwarded { .. } => "messageForwarded",
            ServerEvent::MessageDeleted { .. } => "messageDeleted",
            ServerEvent::FriendRequestReceived { .. } => "friendRequestReceived",
            ServerEvent::FriendRequestSent { .. } => "friendRequestSent",
            ServerEvent::FriendRequestAccepted { .. } => "friendRequestAccepted",
            ServerEvent::Error { .. } => "error",
        }
    }

    /// Encode as an outbound text frame
    pub fn encode(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// First frame of a connection that did not authenticate on upgrade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFrame {
    pub token: String,
}

/// Frame sent before closing a connection that failed to authenticate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthFailure {
    pub error: String,
    pub reason: String,
    pub kind: ErrorKind,
}

impl AuthFailure {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            error: "Authentication error".to_string(),
            reason: reason.into(),
            kind,
        }
    }
}
