/**
 * Connection Registry
 *
 * This module maps a user identity to the live connections currently joined
 * under it (the user's "room") and fans events out to them.
 *
 * # Outboxes
 *
 * Every connection owns a bounded `tokio::sync::mpsc` outbox drained by its
 * writer task. Sending to a user takes a snapshot of the room under the read
 * lock, releases the lock, and then `try_send`s into each outbox:
 *
 * - a full outbox drops the event for that connection (logged at `warn`)
 * - a closed outbox is skipped (the connection is going away)
 * - a user with no connections drops the event silently
 *
 * Sending never waits on a slow receiver. There is no offline buffering.
 *
 * # Ownership
 *
 * One connection belongs to exactly one user for its whole lifetime.
 * The registry is rebuilt from nothing on restart.
 */
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::shared::event::ServerEvent;

/// Default outbox capacity per connection
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

/// Receiving half of a connection's outbox
pub type Outbox = mpsc::Receiver<ServerEvent>;

/// Process-unique connection handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Rooms {
    rooms: HashMap<Uuid, HashMap<ConnectionId, mpsc::Sender<ServerEvent>>>,
    owners: HashMap<ConnectionId, Uuid>,
}

/// Shared map of user → live connections
///
/// Cheap to clone; all clones share the same rooms.
#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<Rooms>>,
    next_id: Arc<AtomicU64>,
    capacity: usize,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOX_CAPACITY)
    }
}

impl ConnectionRegistry {
    /// Create a registry whose outboxes hold `capacity` events each
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Rooms::default())),
            next_id: Arc::new(AtomicU64::new(1)),
            capacity: capacity.max(1),
        }
    }

    /// Join a new connection under `user_id`
    ///
    /// # Returns
    ///
    /// The connection handle and the outbox its writer task should drain
    pub fn join(&self, user_id: Uuid) -> (ConnectionId, Outbox) {
        let connection_id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.capacity);

        let mut rooms = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        rooms.rooms.entry(user_id).or_default().insert(connection_id, tx);
        rooms.owners.insert(connection_id, user_id);
        let room_size = rooms.rooms.get(&user_id).map(HashMap::len).unwrap_or(0);
        drop(rooms);

        tracing::info!(
            "[Registry] {} joined room {} ({} connection(s))",
            connection_id,
            user_id,
            room_size
        );
        (connection_id, rx)
    }

    /// Remove a connection; returns the user it belonged to
    ///
    /// Leaving twice is a no-op.
    pub fn leave(&self, connection_id: ConnectionId) -> Option<Uuid> {
        let mut rooms = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let user_id = rooms.owners.remove(&connection_id)?;
        if let Some(room) = rooms.rooms.get_mut(&user_id) {
            room.remove(&connection_id);
            if room.is_empty() {
                rooms.rooms.remove(&user_id);
            }
        }
        drop(rooms);

        tracing::info!("[Registry] {} left room {}", connection_id, user_id);
        Some(user_id)
    }

    /// Queue `event` for every connection joined under `user_id`
    ///
    /// # Returns
    ///
    /// Number of connections the event was queued for (0 if the user is offline)
    pub fn send_to_user(&self, user_id: Uuid, event: &ServerEvent) -> usize {
        let snapshot: Vec<(ConnectionId, mpsc::Sender<ServerEvent>)> = {
            let rooms = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            match rooms.rooms.get(&user_id) {
                Some(room) => room.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
                None => Vec::new(),
            }
        };

        if snapshot.is_empty() {
            tracing::debug!("[Registry] {} offline, dropping {}", user_id, event.name());
            return 0;
        }

        let delivered = snapshot
            .into_iter()
            .filter(|(connection_id, tx)| Self::offer(*connection_id, tx, event.clone()))
            .count();
        tracing::debug!(
            "[Registry] {} queued for {} connection(s) of {}",
            event.name(),
            delivered,
            user_id
        );
        delivered
    }

    /// Queue `event` for one connection only
    pub fn send_to_connection(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        let tx = {
            let rooms = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            rooms
                .owners
                .get(&connection_id)
                .and_then(|user_id| rooms.rooms.get(user_id))
                .and_then(|room| room.get(&connection_id))
                .cloned()
        };

        match tx {
            Some(tx) => Self::offer(connection_id, &tx, event),
            None => false,
        }
    }

    fn offer(connection_id: ConnectionId, tx: &mpsc::Sender<ServerEvent>, event: ServerEvent) -> bool {
        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    "[Registry] Outbox of {} is full, dropping {}",
                    connection_id,
                    event.name()
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("[Registry] Outbox of {} is closed", connection_id);
                false
            }
        }
    }

    /// Connections currently joined under `user_id`
    pub fn connections_for(&self, user_id: Uuid) -> Vec<ConnectionId> {
        let rooms = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<ConnectionId> = rooms
            .rooms
            .get(&user_id)
            .map(|room| room.keys().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        let rooms = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        rooms.rooms.contains_key(&user_id)
    }

    /// User a connection belongs to
    pub fn owner_of(&self, connection_id: ConnectionId) -> Option<Uuid> {
        let rooms = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        rooms.owners.get(&connection_id).copied()
    }

    /// Total number of live connections
    pub fn connection_count(&self) -> usize {
        let rooms = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        rooms.owners.len()
    }
}
