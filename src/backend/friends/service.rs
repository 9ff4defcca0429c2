//! Friend-request orchestration
//!
//! Applies a friend-graph mutation and, once it has succeeded, pushes the
//! matching events to both users' rooms. Each event carries the counterpart's
//! id and username.

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::backend::graph::SocialGraphStore;
use crate::backend::realtime::ConnectionRegistry;
use crate::shared::event::ServerEvent;
use crate::shared::messaging::{ProfileResponse, RelationsView};

#[derive(Clone)]
pub struct FriendService {
    graph: Arc<dyn SocialGraphStore>,
    registry: ConnectionRegistry,
}

impl FriendService {
    pub fn new(graph: Arc<dyn SocialGraphStore>, registry: ConnectionRegistry) -> Self {
        Self { graph, registry }
    }

    /// `sender` asks `receiver` to become friends
    pub async fn send_request(&self, sender: Uuid, receiver: Uuid) -> BackendResult<()> {
        let sender_profile = self.graph.profile(sender).await?;
        let receiver_profile = self.graph.profile(receiver).await?;

        self.graph.send_request(sender, receiver).await?;
        tracing::info!("[Friends] {} sent a request to {}", sender, receiver);

        self.registry.send_to_user(
            receiver,
            &ServerEvent::FriendRequestReceived {
                user_id: sender,
                username: sender_profile.username,
            },
        );
        self.registry.send_to_user(
            sender,
            &ServerEvent::FriendRequestSent {
                user_id: receiver,
                username: receiver_profile.username,
            },
        );
        Ok(())
    }

    /// `receiver` accepts the request `sender` sent them
    pub async fn accept_request(&self, sender: Uuid, receiver: Uuid) -> BackendResult<()> {
        let sender_profile = self.graph.profile(sender).await?;
        let receiver_profile = self.graph.profile(receiver).await?;

        self.graph.accept_request(sender, receiver).await?;
        tracing::info!("[Friends] {} accepted the request from {}", receiver, sender);

        self.registry.send_to_user(
            sender,
            &ServerEvent::FriendRequestAccepted {
                user_id: receiver,
                username: receiver_profile.username,
            },
        );
        self.registry.send_to_user(
            receiver,
            &ServerEvent::FriendRequestAccepted {
                user_id: sender,
                username: sender_profile.username,
            },
        );
        Ok(())
    }

    pub async fn list_relations(&self, user_id: Uuid) -> BackendResult<RelationsView> {
        self.graph.list_relations(user_id).await
    }

    /// Caller's profile with relation counts and presence
    pub async fn profile(&self, user_id: Uuid) -> BackendResult<ProfileResponse> {
        let profile = self.graph.profile(user_id).await?;
        let relations = self.graph.list_relations(user_id).await?;

        Ok(ProfileResponse {
            id: profile.id,
            username: profile.username,
            friend_count: relations.friends.len(),
            pending_received: relations.pending_received(),
            pending_sent: relations.pending_sent(),
            online: self.registry.is_online(user_id),
        })
    }
}
