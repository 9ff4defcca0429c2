//! Social Graph Module
//!
//! This module maintains the friend, sent-request and received-request
//! relations of every user, and answers the friend gate ("are A and B
//! friends") consulted before every message.
//!
//! # Module Structure
//!
//! ```text
//! graph/
//! ├── mod.rs        - SocialGraphStore trait
//! ├── memory.rs     - In-memory store (single writer lock)
//! └── postgres.rs   - PostgreSQL store (ordered row locks per transaction)
//! ```
//!
//! # Invariants
//!
//! - Friendship is symmetric: `A ∈ friends(B) ⇔ B ∈ friends(A)`
//! - A pending request is recorded on both sides (`sent` of the sender,
//!   `received` of the receiver) and never coexists with friendship
//! - A user never appears in its own sets
//!
//! Every mutation touches both users atomically. Concurrent requests on the
//! same pair are serialized by the implementation, so no interleaving can
//! produce a duplicate pending request or a pending request between friends.

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::shared::messaging::{FriendRequestStatus, RelationsView, UserProfile};

pub mod memory;
pub mod postgres;

pub use memory::MemoryGraphStore;
pub use postgres::PgGraphStore;

/// Durable store of users and their relations
#[async_trait]
pub trait SocialGraphStore: Send + Sync {
    /// Create a user with no relations
    ///
    /// Hook for the external registration service. Fails with
    /// `ConflictError::UsernameTaken` on a duplicate username.
    async fn register_user(&self, username: &str) -> BackendResult<UserProfile>;

    /// Public profile of a user, `NotFoundError::User` if unknown
    async fn profile(&self, user_id: Uuid) -> BackendResult<UserProfile>;

    async fn are_friends(&self, a: Uuid, b: Uuid) -> BackendResult<bool>;

    /// Friend ids of `user_id`, sorted
    async fn friends_of(&self, user_id: Uuid) -> BackendResult<Vec<Uuid>>;

    /// Relation between `a` and `b` from `a`'s side; `user_not_found` when either is unknown
    async fn relation(&self, a: Uuid, b: Uuid) -> BackendResult<FriendRequestStatus>;

    /// Record a pending request from `sender` to `receiver`
    ///
    /// Fails with `SelfRequest`, `NotFound(User)`, `AlreadyFriends`, or
    /// `AlreadyRequested` (a request is pending in either direction).
    async fn send_request(&self, sender: Uuid, receiver: Uuid) -> BackendResult<()>;

    /// Accept the request `sender` sent to `receiver`
    ///
    /// Adds the symmetric friend edge and clears the pending request in both
    /// directions. Fails with `SelfRequest`, `NotFound(User)`, or
    /// `NotFound(Request)` when nothing is pending.
    async fn accept_request(&self, sender: Uuid, receiver: Uuid) -> BackendResult<()>;

    /// Friends/strangers partition of every other registered user
    async fn list_relations(&self, user_id: Uuid) -> BackendResult<RelationsView>;
}
