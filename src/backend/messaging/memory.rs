//! In-memory message store
//!
//! Messages are kept in an append-only log in sequence order with an id
//! index beside it. Mutations run under the write lock, which makes each
//! one atomic for the message it touches.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::MessageStore;
use crate::backend::error::{AuthorizationError, BackendResult, NotFoundError};
use crate::shared::messaging::{HistoryPage, HistoryQuery, Message, NewMessage, Reaction, SeenReceipt};

#[derive(Debug)]
struct StoredMessage {
    seq: u64,
    message: Message,
}

#[derive(Debug, Default)]
struct MessageLog {
    entries: Vec<StoredMessage>,
    index: HashMap<Uuid, usize>,
    next_seq: u64,
}

impl MessageLog {
    fn get_mut(&mut self, id: Uuid) -> BackendResult<&mut Message> {
        let position = *self.index.get(&id).ok_or(NotFoundError::Message(id))?;
        Ok(&mut self.entries[position].message)
    }
}

/// Stamp `seen_at` on an unseen, live message; `delivered_at` is filled first if empty
fn stamp_seen(message: &mut Message, now: DateTime<Utc>) -> Option<SeenReceipt> {
    if message.seen_at.is_some() || message.deleted {
        return None;
    }
    let created_at = message.created_at;
    let delivered_at = *message
        .delivered_at
        .get_or_insert_with(|| now.max(created_at));
    let seen_at = now.max(delivered_at);
    message.seen_at = Some(seen_at);

    Some(SeenReceipt {
        message_id: message.id,
        sender_id: message.sender_id,
        seen_at,
    })
}

/// Message store held in process memory
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    log: RwLock<MessageLog>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages, deleted ones included
    pub async fn len(&self) -> usize {
        self.log.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn create(&self, new: NewMessage) -> BackendResult<Message> {
        let mut log = self.log.write().await;

        let message = Message {
            id: Uuid::now_v7(),
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            kind: new.kind,
            content: new.content,
            duration_ms: new.duration_ms,
            created_at: Utc::now(),
            delivered_at: None,
            seen_at: None,
            reactions: Vec::new(),
            forwarded_from: new.forwarded_from,
            deleted: false,
        };

        let seq = log.next_seq;
        log.next_seq += 1;
        let position = log.entries.len();
        log.index.insert(message.id, position);
        log.entries.push(StoredMessage {
            seq,
            message: message.clone(),
        });

        tracing::debug!(
            "[Messages] Stored {} ({}) {} -> {}",
            message.id,
            message.kind.as_str(),
            message.sender_id,
            message.receiver_id
        );
        Ok(message)
    }

    async fn get(&self, id: Uuid) -> BackendResult<Message> {
        let log = self.log.read().await;
        let position = *log.index.get(&id).ok_or(NotFoundError::Message(id))?;
        Ok(log.entries[position].message.clone())
    }

    async fn mark_delivered(&self, id: Uuid) -> BackendResult<DateTime<Utc>> {
        let mut log = self.log.write().await;
        let message = log.get_mut(id)?;
        let created_at = message.created_at;
        Ok(*message
            .delivered_at
            .get_or_insert_with(|| Utc::now().max(created_at)))
    }

    async fn mark_seen(&self, ids: &[Uuid], reader: Uuid) -> BackendResult<Vec<SeenReceipt>> {
        let mut log = self.log.write().await;
        let now = Utc::now();

        let mut positions: Vec<usize> = ids.iter().filter_map(|id| log.index.get(id).copied()).collect();
        positions.sort_unstable();
        positions.dedup();

        Ok(positions
            .into_iter()
            .filter_map(|position| {
                let message = &mut log.entries[position].message;
                if message.receiver_id != reader {
                    return None;
                }
                stamp_seen(message, now)
            })
            .collect())
    }

    async fn mark_seen_from(&self, counterpart: Uuid, reader: Uuid) -> BackendResult<Vec<SeenReceipt>> {
        let mut log = self.log.write().await;
        let now = Utc::now();

        Ok(log
            .entries
            .iter_mut()
            .filter(|entry| {
                entry.message.sender_id == counterpart && entry.message.receiver_id == reader
            })
            .filter_map(|entry| stamp_seen(&mut entry.message, now))
            .collect())
    }

    async fn add_reaction(&self, id: Uuid, emoji: &str, reactor: Uuid) -> BackendResult<Reaction> {
        let mut log = self.log.write().await;
        let message = log.get_mut(id)?;
        if !message.is_participant(reactor) {
            return Err(AuthorizationError::NotParticipant.into());
        }
        if message.deleted {
            return Err(NotFoundError::Message(id).into());
        }

        let reaction = Reaction {
            emoji: emoji.to_string(),
            user_id: reactor,
            timestamp: Utc::now(),
        };
        message.reactions.push(reaction.clone());
        Ok(reaction)
    }

    async fn soft_delete(&self, id: Uuid, requester: Uuid) -> BackendResult<Message> {
        let mut log = self.log.write().await;
        let message = log.get_mut(id)?;
        if message.sender_id != requester {
            return Err(AuthorizationError::NotOwner.into());
        }
        if message.deleted {
            return Err(NotFoundError::Message(id).into());
        }

        message.deleted = true;
        Ok(message.clone())
    }

    async fn history(&self, a: Uuid, b: Uuid, query: HistoryQuery) -> BackendResult<HistoryPage> {
        let log = self.log.read().await;

        let mut conversation: Vec<&StoredMessage> = log
            .entries
            .iter()
            .filter(|entry| {
                let m = &entry.message;
                !m.deleted
                    && ((m.sender_id == a && m.receiver_id == b)
                        || (m.sender_id == b && m.receiver_id == a))
            })
            .collect();
        conversation.sort_by_key(|entry| (entry.message.created_at, entry.seq));

        let limit = query.effective_limit();
        let offset = query.effective_offset();
        let messages: Vec<Message> = conversation
            .iter()
            .skip(offset)
            .take(limit)
            .map(|entry| entry.message.clone())
            .collect();
        let has_more = conversation.len() > offset + messages.len();

        Ok(HistoryPage { messages, has_more })
    }
}
