//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation, CORS and tracing layers
//! ├── chat_routes.rs  - WebSocket messaging endpoint
//! └── api_routes.rs   - REST endpoints
//! ```

pub mod api_routes;
pub mod chat_routes;
pub mod router;

pub use router::create_router;
