//! Convoflow - Main Library
//!
//! Convoflow is a real-time, friend-gated messaging server. Authenticated
//! users exchange text, voice and image messages over persistent WebSocket
//! connections, with delivery/seen acknowledgement, reactions, forwarding and
//! deletion, restricted to pairs that are mutual friends.
//!
//! # Module Structure
//!
//! The library is organized into two main modules:
//!
//! - **`shared`** - Types shared between server and clients
//!   - Message structures and the social graph views
//!   - The WebSocket event contract
//!   - Error kinds
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Identity verification (JWT)
//!   - Social graph and message stores (in-memory and PostgreSQL)
//!   - Connection registry and per-connection session manager
//!   - Friend-request REST endpoints
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server build (enables backend modules). On by default.
//!
//! # Usage
//!
//! ```rust,no_run
//! use convoflow::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load()?;
//! let app = create_app(&config).await;
//! // Serve `app` with axum
//! # Ok(())
//! # }
//! ```
//!
//! # Data Flow
//!
//! A connection authenticates through the identity verifier, joins the
//! connection registry under its user id, and then sends events that the
//! session manager checks against the social graph before mutating the
//! message store. Results fan out to the sender's and receiver's rooms.
//!
//! # Thread Safety
//!
//! - Stores are `Send + Sync` trait objects behind `Arc`
//! - The connection registry is a lock-protected multimap of bounded outboxes
//! - Each connection is served by one reader task and one writer task

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
