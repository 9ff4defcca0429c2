//! Friend Request Data Structures
//!
//! A friend request is not a standalone record: it is the pair of entries in
//! the sender's sent set and the receiver's received set. These types are the
//! REST payloads used to create and accept one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::ErrorKind;

/// Relation between an ordered pair of users, from the first user's side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FriendRequestStatus {
    /// No relation
    None,
    /// First user asked the second
    PendingSent,
    /// Second user asked the first
    PendingReceived,
    /// Symmetric and terminal
    Friends,
}

impl FriendRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendRequestStatus::None => "none",
            FriendRequestStatus::PendingSent => "pending_sent",
            FriendRequestStatus::PendingReceived => "pending_received",
            FriendRequestStatus::Friends => "friends",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            FriendRequestStatus::PendingSent | FriendRequestStatus::PendingReceived
        )
    }
}

/// Request to send a friend request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFriendRequestRequest {
    pub receiver_id: Uuid,
}

/// Request to accept a pending friend request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptFriendRequestRequest {
    pub sender_id: Uuid,
}

/// Result of a friend-request mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FriendRequestResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            kind: None,
            error: None,
        }
    }
}
