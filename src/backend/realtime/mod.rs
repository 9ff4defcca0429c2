//! Real-time Delivery Module
//!
//! This module holds the connection registry: the per-user rooms of live
//! WebSocket connections and the fan-out primitive every other component
//! uses to push events to users.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! └── registry.rs     - Rooms, bounded outboxes, send-to-user
//! ```
//!
//! # Example
//!
//! ```rust
//! use convoflow::backend::realtime::ConnectionRegistry;
//! use convoflow::shared::ServerEvent;
//! use uuid::Uuid;
//!
//! let registry = ConnectionRegistry::default();
//! let user = Uuid::new_v4();
//! let (_connection, mut outbox) = registry.join(user);
//!
//! let event = ServerEvent::MessageDeleted { message_id: Uuid::new_v4() };
//! assert_eq!(registry.send_to_user(user, &event), 1);
//! assert_eq!(outbox.try_recv().ok(), Some(event));
//! ```

pub mod registry;

pub use registry::{ConnectionId, ConnectionRegistry, Outbox, DEFAULT_OUTBOX_CAPACITY};
