//! Messaging Module
//!
//! This module contains the data structures of the messaging core:
//!
//! - `Message` - A direct message between two users and its lifecycle fields
//! - `RelationsView` - The friends/strangers partition of the social graph
//! - `FriendRequestStatus` - Relation between two users
//!
//! # Usage
//!
//! ```rust
//! use convoflow::shared::messaging::{Message, MessageKind, RelationsView};
//! ```

pub mod friend_request;
pub mod message;
pub mod relations;

// Re-export all types
pub use friend_request::{
    AcceptFriendRequestRequest, FriendRequestResponse, FriendRequestStatus,
    SendFriendRequestRequest,
};
pub use message::{
    HistoryPage, HistoryQuery, Message, MessageKind, NewMessage, Reaction, SeenReceipt,
    DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
pub use relations::{ProfileResponse, RelationsView, StrangerEntry, UserProfile};
