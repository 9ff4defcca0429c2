/**
 * Session Event Handler
 *
 * One `SessionHandler` serves one authenticated connection. It turns each
 * inbound [`ClientEvent`] into store mutations followed by notifications
 * through the connection registry.
 *
 * # Error Policy
 *
 * A rejected event is answered with an `error{kind, reason}` event sent to
 * the originating connection only. Nothing is notified until the store
 * mutation for the event has been applied, so a rejection never leaves a
 * partially applied change behind.
 *
 * # Send Sequence
 *
 * ```text
 * validate ─▶ friend gate ─▶ create ─▶ receiveMessage (receiver)
 *                                    ─▶ messageAccepted (sender)
 *                                    ─▶ messagePayload (receiver, voice/image)
 *                                    ─▶ mark delivered ─▶ messageDelivered (sender)
 * ```
 *
 * Delivery is stamped as soon as the message has been queued, whether or not
 * the receiver is online.
 */
use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::{
    AuthorizationError, BackendError, BackendResult, NotFoundError, ValidationError,
};
use crate::backend::graph::SocialGraphStore;
use crate::backend::messaging::{MessageStore, PayloadId, PayloadStore};
use crate::backend::realtime::{ConnectionId, ConnectionRegistry};
use crate::backend::server::state::AppState;
use crate::shared::event::{ClientEvent, ServerEvent};
use crate::shared::messaging::{Message, MessageKind, NewMessage, Reaction, SeenReceipt};

#[derive(Clone)]
pub struct SessionHandler {
    graph: Arc<dyn SocialGraphStore>,
    messages: Arc<dyn MessageStore>,
    payloads: Arc<dyn PayloadStore>,
    registry: ConnectionRegistry,
    user_id: Uuid,
    connection_id: ConnectionId,
}

impl SessionHandler {
    pub fn new(state: &AppState, user_id: Uuid, connection_id: ConnectionId) -> Self {
        Self {
            graph: state.graph.clone(),
            messages: state.messages.clone(),
            payloads: state.payloads.clone(),
            registry: state.registry.clone(),
            user_id,
            connection_id,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Decode and handle one inbound text frame
    pub async fn handle_frame(&self, frame: &str) -> BackendResult<()> {
        match ClientEvent::decode(frame) {
            Ok(event) => self.handle(event).await,
            Err(e) => {
                tracing::warn!("[Session] Undecodable frame from {}: {}", self.user_id, e);
                let err = BackendError::from(e);
                self.reply(err.to_event());
                Err(err)
            }
        }
    }

    /// Handle one inbound event
    ///
    /// A failure is reported to the originating connection before being
    /// returned; callers may ignore the result.
    pub async fn handle(&self, event: ClientEvent) -> BackendResult<()> {
        let name = event.name();
        tracing::debug!("[Session] {} from {} on {}", name, self.user_id, self.connection_id);

        let result = match event {
            ClientEvent::SendMessage {
                receiver_id,
                kind,
                content,
                payload_id,
                duration_ms,
            } => self
                .send_message(receiver_id, kind, content, payload_id, duration_ms)
                .await
                .map(|_| ()),
            ClientEvent::MarkMessagesAsSeen { counterpart_id } => {
                self.mark_seen(counterpart_id).await.map(|_| ())
            }
            ClientEvent::AddReaction { message_id, emoji } => {
                self.add_reaction(message_id, &emoji).await.map(|_| ())
            }
            ClientEvent::ForwardMessage {
                message_id,
                receiver_ids,
            } => self.forward(message_id, &receiver_ids).await.map(|_| ()),
            ClientEvent::DeleteMessage { message_id } => {
                self.delete_message(message_id).await.map(|_| ())
            }
        };

        if let Err(err) = &result {
            if err.is_retryable() {
                tracing::error!("[Session] {} from {} failed: {}", name, self.user_id, err);
            } else {
                tracing::warn!("[Session] {} from {} rejected: {}", name, self.user_id, err);
            }
            self.reply(err.to_event());
        }
        result
    }

    fn reply(&self, event: ServerEvent) {
        if !self.registry.send_to_connection(self.connection_id, event) {
            tracing::debug!("[Session] Could not reply on {}", self.connection_id);
        }
    }

    /// Validate, gate and store a message, then run the delivery sequence
    pub async fn send_message(
        &self,
        receiver_id: Uuid,
        kind: MessageKind,
        content: Option<String>,
        payload_id: Option<String>,
        duration_ms: Option<u32>,
    ) -> BackendResult<Message> {
        let body = match kind {
            MessageKind::Text => content
                .filter(|text| !text.trim().is_empty())
                .ok_or(ValidationError::MissingField("content"))?,
            MessageKind::Voice | MessageKind::Image => {
                let raw = payload_id
                    .or(content)
                    .filter(|raw| !raw.trim().is_empty())
                    .ok_or(ValidationError::MissingField("payloadId"))?;
                self.resolve_payload(&raw).await?.to_string()
            }
        };

        if !self.graph.are_friends(self.user_id, receiver_id).await? {
            return Err(AuthorizationError::NotFriends.into());
        }

        let message = self
            .messages
            .create(NewMessage {
                sender_id: self.user_id,
                receiver_id,
                kind,
                content: body,
                duration_ms: if kind == MessageKind::Voice { duration_ms } else { None },
                forwarded_from: None,
            })
            .await?;

        tracing::info!(
            "[Session] {} sent {} message {} to {}",
            self.user_id,
            kind.as_str(),
            message.id,
            receiver_id
        );
        self.deliver(message).await
    }

    async fn resolve_payload(&self, raw: &str) -> BackendResult<PayloadId> {
        let id = PayloadId::parse(raw)
            .ok_or_else(|| ValidationError::InvalidReference(raw.to_string()))?;
        match self.payloads.owner(id).await? {
            Some(owner) if owner == self.user_id => Ok(id),
            Some(owner) => {
                tracing::warn!(
                    "[Session] {} referenced payload {} uploaded by {}",
                    self.user_id,
                    id,
                    owner
                );
                Err(ValidationError::InvalidReference(raw.to_string()).into())
            }
            None => Err(ValidationError::InvalidReference(raw.to_string()).into()),
        }
    }

    /// Notify both sides of a freshly stored message and stamp delivery
    async fn deliver(&self, mut message: Message) -> BackendResult<Message> {
        self.registry.send_to_user(
            message.receiver_id,
            &ServerEvent::ReceiveMessage {
                message: message.clone(),
            },
        );
        self.registry.send_to_user(
            message.sender_id,
            &ServerEvent::MessageAccepted {
                message: message.clone(),
            },
        );

        if message.kind.carries_payload() {
            self.registry.send_to_user(
                message.receiver_id,
                &ServerEvent::MessagePayload {
                    message_id: message.id,
                    payload_id: message.content.clone(),
                    kind: message.kind,
                    duration_ms: message.duration_ms,
                },
            );
        }

        let delivered_at = self.messages.mark_delivered(message.id).await?;
        message.delivered_at = Some(delivered_at);
        self.registry.send_to_user(
            message.sender_id,
            &ServerEvent::MessageDelivered {
                message_id: message.id,
                delivered_at,
            },
        );
        Ok(message)
    }

    /// Mark everything `counterpart_id` sent us as seen and tell them
    pub async fn mark_seen(&self, counterpart_id: Uuid) -> BackendResult<Vec<SeenReceipt>> {
        let receipts = self
            .messages
            .mark_seen_from(counterpart_id, self.user_id)
            .await?;

        for receipt in &receipts {
            self.registry.send_to_user(
                receipt.sender_id,
                &ServerEvent::MessageSeen {
                    message_id: receipt.message_id,
                    seen_at: receipt.seen_at,
                },
            );
        }

        if !receipts.is_empty() {
            tracing::debug!(
                "[Session] {} saw {} message(s) from {}",
                self.user_id,
                receipts.len(),
                counterpart_id
            );
        }
        Ok(receipts)
    }

    pub async fn add_reaction(&self, message_id: Uuid, emoji: &str) -> BackendResult<Reaction> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(ValidationError::MissingField("emoji").into());
        }

        let reaction = self
            .messages
            .add_reaction(message_id, emoji, self.user_id)
            .await?;
        let message = self.messages.get(message_id).await?;

        let event = ServerEvent::ReactionAdded {
            message_id,
            emoji: reaction.emoji.clone(),
            user_id: reaction.user_id,
            timestamp: reaction.timestamp,
        };
        self.registry.send_to_user(message.sender_id, &event);
        self.registry.send_to_user(message.receiver_id, &event);
        Ok(reaction)
    }

    /// Forward a message to every current friend among `receiver_ids`
    ///
    /// # Returns
    ///
    /// The targets a copy was actually created for, in request order
    pub async fn forward(&self, message_id: Uuid, receiver_ids: &[Uuid]) -> BackendResult<Vec<Uuid>> {
        let original = self.messages.get(message_id).await?;
        if !original.is_participant(self.user_id) {
            return Err(AuthorizationError::NotParticipant.into());
        }
        if original.deleted {
            return Err(NotFoundError::Message(message_id).into());
        }

        let mut targets: Vec<Uuid> = Vec::with_capacity(receiver_ids.len());
        for &receiver_id in receiver_ids {
            if receiver_id == self.user_id || targets.contains(&receiver_id) {
                continue;
            }
            if self.graph.are_friends(self.user_id, receiver_id).await? {
                targets.push(receiver_id);
            } else {
                tracing::debug!(
                    "[Session] Skipping forward of {} to non-friend {}",
                    message_id,
                    receiver_id
                );
            }
        }

        let mut forwarded_to = Vec::with_capacity(targets.len());
        for receiver_id in targets {
            let copy = self
                .messages
                .create(NewMessage::forward_of(&original, self.user_id, receiver_id))
                .await?;
            self.deliver(copy).await?;
            forwarded_to.push(receiver_id);
        }

        tracing::info!(
            "[Session] {} forwarded {} to {} friend(s)",
            self.user_id,
            message_id,
            forwarded_to.len()
        );
        self.registry.send_to_user(
            self.user_id,
            &ServerEvent::MessageForwarded {
                forwarded_to: forwarded_to.clone(),
                original_message_id: message_id,
            },
        );
        Ok(forwarded_to)
    }

    pub async fn delete_message(&self, message_id: Uuid) -> BackendResult<Message> {
        let message = self.messages.soft_delete(message_id, self.user_id).await?;

        let event = ServerEvent::MessageDeleted { message_id };
        self.registry.send_to_user(message.sender_id, &event);
        self.registry.send_to_user(message.receiver_id, &event);
        tracing::info!("[Session] {} deleted message {}", self.user_id, message_id);
        Ok(message)
    }
}
