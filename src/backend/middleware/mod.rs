//! Middleware Module
//!
//! Request processing shared by the REST handlers.
//!
//! - **`auth`** - `AuthUser` extractor for routes that require a verified identity

pub mod auth;

pub use auth::{AuthUser, AuthenticatedUser};
