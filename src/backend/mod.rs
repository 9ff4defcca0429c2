//! Backend Module
//!
//! This module contains all server-side code for convoflow. It provides an
//! Axum HTTP + WebSocket server for friend-gated direct messaging.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`auth`** - Identity verification (JWT)
//! - **`middleware`** - `AuthUser` extractor for REST handlers
//! - **`graph`** - Social graph store (users, friends, pending requests)
//! - **`messaging`** - Message store, payload store, history endpoints
//! - **`realtime`** - Connection registry (per-user rooms, outboxes)
//! - **`session`** - Per-connection session manager and WebSocket transport
//! - **`friends`** - Friend-request orchestration and endpoints
//! - **`error`** - Backend error taxonomy
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - convoflow-server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── auth/           - Identity verifier
//! ├── middleware/     - Request extractors
//! ├── graph/          - Social graph store
//! ├── messaging/      - Message and payload stores
//! ├── realtime/       - Connection registry
//! ├── session/        - Messaging sessions
//! ├── friends/        - Friend requests
//! └── error/          - Error types
//! ```
//!
//! # Storage
//!
//! Every store sits behind a `Send + Sync` trait. In-memory implementations
//! are always available; PostgreSQL implementations are used when
//! `DATABASE_URL` is configured.

pub mod auth;
pub mod error;
pub mod friends;
pub mod graph;
pub mod messaging;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod server;
pub mod session;

pub use error::{BackendError, BackendResult};
