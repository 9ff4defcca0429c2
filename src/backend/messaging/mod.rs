//! Messaging Module
//!
//! This module owns message records and binary payloads:
//!
//! - **`MessageStore`** - durable ordered log of messages with mutable
//!   lifecycle fields (delivered, seen, reactions, soft delete)
//! - **`PayloadStore`** - voice/image bytes referenced by an opaque id
//! - **`handlers`** - REST endpoints for history and payload upload/download
//!
//! # Ordering
//!
//! Messages are ordered by `created_at`, ties broken by a per-store
//! sequence assigned at creation. Ids are UUIDv7 and never reused.
//!
//! # Lifecycle
//!
//! `delivered_at` is set once and never before `created_at`. Marking a message
//! seen also stamps `delivered_at` when it is still empty, so `seen_at` is
//! never earlier than `delivered_at` even when the seen receipt overtakes the
//! delivery acknowledgement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::shared::messaging::{HistoryPage, HistoryQuery, Message, NewMessage, Reaction, SeenReceipt};

pub mod db;
pub mod handlers;
pub mod memory;
pub mod payloads;

pub use db::PgMessageStore;
pub use memory::MemoryMessageStore;
pub use payloads::{MemoryPayloadStore, PayloadId, PayloadStore, DEFAULT_MAX_PAYLOAD_BYTES};

/// Durable store of messages
///
/// Every mutation is atomic per message. Nothing here checks the friend
/// gate; callers do that before `create`.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a new message, assigning id, sequence and `created_at`
    async fn create(&self, message: NewMessage) -> BackendResult<Message>;

    /// Load a message, including soft-deleted ones
    async fn get(&self, id: Uuid) -> BackendResult<Message>;

    /// Stamp `delivered_at` if unset; returns the stored value either way
    async fn mark_delivered(&self, id: Uuid) -> BackendResult<DateTime<Utc>>;

    /// Mark the given messages addressed to `reader` as seen
    ///
    /// Only currently-unseen, non-deleted messages are updated; the receipts
    /// of those are returned, in message order.
    async fn mark_seen(&self, ids: &[Uuid], reader: Uuid) -> BackendResult<Vec<SeenReceipt>>;

    /// Mark every unseen message from `counterpart` to `reader` as seen
    async fn mark_seen_from(&self, counterpart: Uuid, reader: Uuid) -> BackendResult<Vec<SeenReceipt>>;

    /// Append a reaction by a participant of the message
    async fn add_reaction(&self, id: Uuid, emoji: &str, reactor: Uuid) -> BackendResult<Reaction>;

    /// Soft-delete a message on behalf of its sender
    async fn soft_delete(&self, id: Uuid, requester: Uuid) -> BackendResult<Message>;

    /// Non-deleted messages between `a` and `b`, ascending by time
    async fn history(&self, a: Uuid, b: Uuid, query: HistoryQuery) -> BackendResult<HistoryPage>;
}
