//! In-memory social graph
//!
//! All user records live behind one `RwLock`. Every mutation takes the write
//! lock, validates against both users and mutates both before releasing it,
//! which serializes concurrent requests on any pair.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::SocialGraphStore;
use crate::backend::error::{BackendResult, ConflictError, NotFoundError};
use crate::shared::messaging::{FriendRequestStatus, RelationsView, StrangerEntry, UserProfile};

#[derive(Debug, Clone)]
struct UserRecord {
    profile: UserProfile,
    friends: BTreeSet<Uuid>,
    sent: BTreeSet<Uuid>,
    received: BTreeSet<Uuid>,
}

impl UserRecord {
    fn status_towards(&self, other: Uuid) -> FriendRequestStatus {
        if self.friends.contains(&other) {
            FriendRequestStatus::Friends
        } else if self.sent.contains(&other) {
            FriendRequestStatus::PendingSent
        } else if self.received.contains(&other) {
            FriendRequestStatus::PendingReceived
        } else {
            FriendRequestStatus::None
        }
    }
}

#[derive(Debug, Default)]
struct GraphState {
    users: HashMap<Uuid, UserRecord>,
    usernames: HashMap<String, Uuid>,
}

impl GraphState {
    fn user(&self, id: Uuid) -> BackendResult<&UserRecord> {
        self.users.get(&id).ok_or_else(|| NotFoundError::User(id).into())
    }

    /// Mutable access to two distinct users at once
    fn pair_mut(&mut self, a: Uuid, b: Uuid) -> BackendResult<(&mut UserRecord, &mut UserRecord)> {
        self.user(a)?;
        self.user(b)?;
        let mut first = None;
        let mut second = None;
        for (id, record) in self.users.iter_mut() {
            if *id == a {
                first = Some(record);
            } else if *id == b {
                second = Some(record);
            }
        }
        match (first, second) {
            (Some(first), Some(second)) => Ok((first, second)),
            _ => Err(ConflictError::SelfRequest.into()),
        }
    }
}

/// Social graph held in process memory
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    state: RwLock<GraphState>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SocialGraphStore for MemoryGraphStore {
    async fn register_user(&self, username: &str) -> BackendResult<UserProfile> {
        let mut state = self.state.write().await;
        if state.usernames.contains_key(username) {
            return Err(ConflictError::UsernameTaken(username.to_string()).into());
        }

        let profile = UserProfile {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        state.usernames.insert(profile.username.clone(), profile.id);
        state.users.insert(
            profile.id,
            UserRecord {
                profile: profile.clone(),
                friends: BTreeSet::new(),
                sent: BTreeSet::new(),
                received: BTreeSet::new(),
            },
        );
        tracing::debug!("[Graph] Registered user {} ({})", profile.username, profile.id);
        Ok(profile)
    }

    async fn profile(&self, user_id: Uuid) -> BackendResult<UserProfile> {
        let state = self.state.read().await;
        Ok(state.user(user_id)?.profile.clone())
    }

    async fn are_friends(&self, a: Uuid, b: Uuid) -> BackendResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .users
            .get(&a)
            .map(|record| record.friends.contains(&b))
            .unwrap_or(false))
    }

    async fn friends_of(&self, user_id: Uuid) -> BackendResult<Vec<Uuid>> {
        let state = self.state.read().await;
        Ok(state.user(user_id)?.friends.iter().copied().collect())
    }

    async fn relation(&self, a: Uuid, b: Uuid) -> BackendResult<FriendRequestStatus> {
        let state = self.state.read().await;
        state.user(b)?;
        Ok(state.user(a)?.status_towards(b))
    }

    async fn send_request(&self, sender: Uuid, receiver: Uuid) -> BackendResult<()> {
        if sender == receiver {
            return Err(ConflictError::SelfRequest.into());
        }

        let mut state = self.state.write().await;
        let (from, to) = state.pair_mut(sender, receiver)?;
        match from.status_towards(receiver) {
            FriendRequestStatus::Friends => return Err(ConflictError::AlreadyFriends.into()),
            FriendRequestStatus::PendingSent | FriendRequestStatus::PendingReceived => {
                return Err(ConflictError::AlreadyRequested.into())
            }
            FriendRequestStatus::None => {}
        }

        from.sent.insert(receiver);
        to.received.insert(sender);
        tracing::debug!("[Graph] Request pending {} -> {}", sender, receiver);
        Ok(())
    }

    async fn accept_request(&self, sender: Uuid, receiver: Uuid) -> BackendResult<()> {
        if sender == receiver {
            return Err(ConflictError::SelfRequest.into());
        }

        let mut state = self.state.write().await;
        let (from, to) = state.pair_mut(sender, receiver)?;
        if !from.sent.contains(&receiver) || !to.received.contains(&sender) {
            return Err(NotFoundError::Request.into());
        }

        from.sent.remove(&receiver);
        from.received.remove(&receiver);
        to.sent.remove(&sender);
        to.received.remove(&sender);
        from.friends.insert(receiver);
        to.friends.insert(sender);
        tracing::debug!("[Graph] {} and {} are now friends", sender, receiver);
        Ok(())
    }

    async fn list_relations(&self, user_id: Uuid) -> BackendResult<RelationsView> {
        let state = self.state.read().await;
        let me = state.user(user_id)?;

        let friends = me.friends.iter().copied().collect();
        let mut strangers: Vec<StrangerEntry> = state
            .users
            .values()
            .filter(|other| other.profile.id != user_id && !me.friends.contains(&other.profile.id))
            .map(|other| StrangerEntry {
                user_id: other.profile.id,
                username: other.profile.username.clone(),
                sent_pending: me.sent.contains(&other.profile.id),
                received_pending: me.received.contains(&other.profile.id),
            })
            .collect();
        strangers.sort_by(|a, b| a.username.cmp(&b.username));

        Ok(RelationsView { friends, strangers })
    }
}
