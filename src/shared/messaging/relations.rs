//! Social Graph Views
//!
//! Read-side shapes of the friend graph: a user's public profile, and the
//! friends/strangers partition returned by the relations listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public part of a registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A non-friend user, with pending-request flags from the caller's side
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StrangerEntry {
    pub user_id: Uuid,
    pub username: String,
    /// Caller has sent this user a request that is still pending
    pub sent_pending: bool,
    /// This user has sent the caller a request that is still pending
    pub received_pending: bool,
}

/// Friends/strangers partition of every other registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RelationsView {
    /// Friend ids, sorted
    pub friends: Vec<Uuid>,
    /// Everyone else, sorted by username
    pub strangers: Vec<StrangerEntry>,
}

impl RelationsView {
    pub fn is_friend(&self, user_id: Uuid) -> bool {
        self.friends.binary_search(&user_id).is_ok()
    }

    pub fn stranger(&self, user_id: Uuid) -> Option<&StrangerEntry> {
        self.strangers.iter().find(|s| s.user_id == user_id)
    }

    pub fn pending_received(&self) -> usize {
        self.strangers.iter().filter(|s| s.received_pending).count()
    }

    pub fn pending_sent(&self) -> usize {
        self.strangers.iter().filter(|s| s.sent_pending).count()
    }
}

/// Response for `GET /api/profile`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub friend_count: usize,
    pub pending_received: usize,
    pub pending_sent: usize,
    pub online: bool,
}
