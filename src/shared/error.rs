//! Shared Error Types
//!
//! This module defines the error vocabulary that crosses the wire. Servers
//! produce it, clients match on it.
//!
//! # Error Kinds
//!
//! Every rejected operation carries an [`ErrorKind`]: a stable, snake_case
//! identifier that clients can switch on without parsing the human-readable
//! reason. Kinds are grouped into families ([`ErrorCategory`]):
//!
//! - `Auth` - credential missing, invalid, or not presented in time
//! - `Authorization` - caller is authenticated but not allowed
//! - `Validation` - the request itself is incomplete or points nowhere
//! - `NotFound` - a referenced user, message, payload, or request does not exist
//! - `Conflict` - the request collides with existing relation state
//! - `Store` - the durable store could not serve the request (retryable)
//!
//! # Usage
//!
//! ```rust
//! use convoflow::shared::error::{ErrorKind, ErrorCategory};
//!
//! assert_eq!(ErrorKind::NotFriends.category(), ErrorCategory::Authorization);
//! assert!(ErrorKind::StoreUnavailable.is_retryable());
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine-readable error kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthMissing,
    AuthInvalid,
    AuthTimeout,
    NotFriends,
    NotParticipant,
    NotOwner,
    MissingField,
    InvalidReference,
    PayloadTooLarge,
    UserNotFound,
    MessageNotFound,
    PayloadNotFound,
    NoSuchRequest,
    AlreadyFriends,
    AlreadyRequested,
    SelfRequest,
    UsernameTaken,
    StoreUnavailable,
    /// Inbound frame could not be decoded into a known event
    MalformedEvent,
}

/// Error family a kind belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Auth,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    Store,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AuthMissing => "auth_missing",
            ErrorKind::AuthInvalid => "auth_invalid",
            ErrorKind::AuthTimeout => "auth_timeout",
            ErrorKind::NotFriends => "not_friends",
            ErrorKind::NotParticipant => "not_participant",
            ErrorKind::NotOwner => "not_owner",
            ErrorKind::MissingField => "missing_field",
            ErrorKind::InvalidReference => "invalid_reference",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::UserNotFound => "user_not_found",
            ErrorKind::MessageNotFound => "message_not_found",
            ErrorKind::PayloadNotFound => "payload_not_found",
            ErrorKind::NoSuchRequest => "no_such_request",
            ErrorKind::AlreadyFriends => "already_friends",
            ErrorKind::AlreadyRequested => "already_requested",
            ErrorKind::SelfRequest => "self_request",
            ErrorKind::UsernameTaken => "username_taken",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::MalformedEvent => "malformed_event",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::AuthMissing | ErrorKind::AuthInvalid | ErrorKind::AuthTimeout => {
                ErrorCategory::Auth
            }
            ErrorKind::NotFriends | ErrorKind::NotParticipant | ErrorKind::NotOwner => {
                ErrorCategory::Authorization
            }
            ErrorKind::MissingField
            | ErrorKind::InvalidReference
            | ErrorKind::PayloadTooLarge
            | ErrorKind::MalformedEvent => ErrorCategory::Validation,
            ErrorKind::UserNotFound
            | ErrorKind::MessageNotFound
            | ErrorKind::PayloadNotFound
            | ErrorKind::NoSuchRequest => ErrorCategory::NotFound,
            ErrorKind::AlreadyFriends
            | ErrorKind::AlreadyRequested
            | ErrorKind::SelfRequest
            | ErrorKind::UsernameTaken => ErrorCategory::Conflict,
            ErrorKind::StoreUnavailable => ErrorCategory::Store,
        }
    }

    /// Whether the client may retry the same operation unchanged
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Store
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while encoding or decoding wire types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SerializationError { .. } => ErrorKind::MalformedEvent,
            Self::ValidationError { .. } => ErrorKind::MissingField,
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
