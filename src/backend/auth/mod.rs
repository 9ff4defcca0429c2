//! Authentication Module
//!
//! This module verifies the bearer credentials presented by clients. It is
//! the identity verifier of the messaging core: both the WebSocket handshake
//! and the REST extractor go through [`JwtVerifier::verify`].
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! └── sessions.rs     - JWT claims, verification and issuing
//! ```
//!
//! # Credential Sources
//!
//! - `Authorization: Bearer <token>` header (REST and WebSocket upgrade)
//! - `?token=<token>` query parameter (WebSocket upgrade)
//! - First WebSocket frame `{"token": "..."}` (see `session::handshake`)
//!
//! Registration, password hashing and token issuance belong to an external
//! credential service.

/// JWT token generation and validation
pub mod sessions;

pub use sessions::{Claims, JwtVerifier};

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
