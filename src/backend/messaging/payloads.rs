//! Binary payload store
//!
//! Voice notes and images travel outside the message record: the client
//! uploads the bytes, gets an opaque payload id back, and sends a message
//! whose content is that id. The message store never sees the bytes. Only
//! the uploader may reference a payload in a new message.
//!
//! `MemoryPayloadStore` keeps every payload until the process exits and
//! nothing is evicted. With the Postgres message store, voice and image
//! messages outlive their payloads across a restart; downloading one then
//! answers `payload_not_found`.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::{BackendResult, ValidationError};

/// Default upper bound on a single payload (10 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Opaque, unguessable payload reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadId(Uuid);

impl PayloadId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a client-supplied reference
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for PayloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Capability to store and fetch binary payloads by id
#[async_trait]
pub trait PayloadStore: Send + Sync {
    /// Store `bytes` uploaded by `owner`, returning a fresh id
    async fn put(&self, owner: Uuid, bytes: Bytes) -> BackendResult<PayloadId>;

    async fn get(&self, id: PayloadId) -> BackendResult<Option<Bytes>>;

    /// Uploader of a payload, `None` when the id is unknown
    async fn owner(&self, id: PayloadId) -> BackendResult<Option<Uuid>>;
}

#[derive(Debug, Clone)]
struct StoredPayload {
    owner: Uuid,
    bytes: Bytes,
}

/// Payload store held in process memory
#[derive(Debug)]
pub struct MemoryPayloadStore {
    payloads: RwLock<HashMap<PayloadId, StoredPayload>>,
    max_bytes: usize,
}

impl Default for MemoryPayloadStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD_BYTES)
    }
}

impl MemoryPayloadStore {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            payloads: RwLock::new(HashMap::new()),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

#[async_trait]
impl PayloadStore for MemoryPayloadStore {
    async fn put(&self, owner: Uuid, bytes: Bytes) -> BackendResult<PayloadId> {
        if bytes.is_empty() {
            return Err(ValidationError::MissingField("body").into());
        }
        if bytes.len() > self.max_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            }
            .into());
        }

        let id = PayloadId::new();
        let size = bytes.len();
        self.payloads
            .write()
            .await
            .insert(id, StoredPayload { owner, bytes });
        tracing::debug!("[Payloads] Stored {} ({} bytes) for {}", id, size, owner);
        Ok(id)
    }

    async fn get(&self, id: PayloadId) -> BackendResult<Option<Bytes>> {
        Ok(self
            .payloads
            .read()
            .await
            .get(&id)
            .map(|payload| payload.bytes.clone()))
    }

    async fn owner(&self, id: PayloadId) -> BackendResult<Option<Uuid>> {
        Ok(self.payloads.read().await.get(&id).map(|payload| payload.owner))
    }
}
