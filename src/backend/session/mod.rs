//! Messaging Session Module
//!
//! One session per WebSocket connection:
//!
//! - **`state`** - `Unauthenticated → Authenticated → Closed` state machine
//! - **`handshake`** - credential resolution with a bounded first-frame wait
//! - **`handler`** - inbound event handling (send, seen, react, forward, delete)
//! - **`ws`** - axum WebSocket transport (reader loop + outbox writer)

pub mod handler;
pub mod handshake;
pub mod state;
pub mod ws;

pub use handler::SessionHandler;
pub use state::SessionState;
pub use ws::ws_handler;
