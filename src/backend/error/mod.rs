//! Backend Error Module
//!
//! This module defines the error taxonomy of the server. Errors are used by
//! stores, REST handlers and the session manager, and can be converted to
//! HTTP responses or `error` events.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error families and the BackendError wrapper
//! └── conversion.rs - IntoResponse and event conversion
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::{
    AuthError, AuthorizationError, BackendError, ConflictError, NotFoundError, StoreError,
    ValidationError,
};

/// Result alias used throughout the backend
pub type BackendResult<T> = Result<T, BackendError>;
