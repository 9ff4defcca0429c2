//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and its clients. They carry no server dependencies and are
//! what travels over the WebSocket and REST surfaces.

/// Real-time event contract
pub mod event;

/// Shared error types
pub mod error;

/// Messaging and social graph types
pub mod messaging;

/// Re-export commonly used types for convenience
pub use error::{ErrorCategory, ErrorKind, SharedError};
pub use event::{AuthFailure, AuthFrame, ClientEvent, ServerEvent};
pub use messaging::{Message, MessageKind};
