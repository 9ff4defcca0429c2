/**
 * Backend Error Types
 *
 * This module defines the error taxonomy of the messaging core. Every
 * failure belongs to one family, and every family wraps a small leaf enum:
 *
 * - `AuthError` - credential missing, invalid, or not presented in time
 * - `AuthorizationError` - authenticated, but not allowed
 * - `ValidationError` - request incomplete or pointing at nothing
 * - `NotFoundError` - referenced user, message, payload or request does not exist
 * - `ConflictError` - request collides with existing relation state
 * - `StoreError` - durable store unavailable (retryable)
 *
 * # Error Categories
 *
 * Authorization, validation, not-found and conflict errors are expected
 * control flow. Handlers recover them at their boundary and turn them into
 * a structured response or `error` event. Store errors are surfaced as a
 * retryable failure and never carry driver details to the client.
 */
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::error::ErrorKind;
use crate::shared::SharedError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No authentication token provided")]
    Missing,
    #[error("Invalid or expired token")]
    Invalid,
    #[error("Authentication was not completed in time")]
    Timeout,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("You can only message friends")]
    NotFriends,
    #[error("You are not part of this conversation")]
    NotParticipant,
    #[error("Only the sender can do this")]
    NotOwner,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Unknown reference: {0}")]
    InvalidReference(String),
    #[error("Payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("User not found")]
    User(Uuid),
    #[error("Message not found")]
    Message(Uuid),
    #[error("Payload not found")]
    Payload(String),
    #[error("No pending friend request")]
    Request,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConflictError {
    #[error("Already friends")]
    AlreadyFriends,
    #[error("Friend request already pending")]
    AlreadyRequested,
    #[error("Cannot send a friend request to yourself")]
    SelfRequest,
    #[error("Username already taken: {0}")]
    UsernameTaken(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Detail is for logs only
    #[error("Storage is temporarily unavailable")]
    Unavailable(String),
}

/// Backend-specific error types
///
/// Each variant wraps one family of the taxonomy. Every variant can be
/// rendered as an HTTP response (`IntoResponse`) or as an `error` event on a
/// messaging connection (`to_event`).
///
/// # Usage
///
/// ```rust
/// use convoflow::backend::error::{AuthorizationError, BackendError};
/// use convoflow::shared::ErrorKind;
///
/// let err: BackendError = AuthorizationError::NotFriends.into();
/// assert_eq!(err.kind(), ErrorKind::NotFriends);
/// assert_eq!(err.status_code().as_u16(), 403);
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Wire encoding/decoding failure (from the shared module)
    #[error(transparent)]
    Shared(#[from] SharedError),
}

impl BackendError {
    /// Create a store-unavailable error from any driver error
    pub fn unavailable(detail: impl std::fmt::Display) -> Self {
        Self::Store(StoreError::Unavailable(detail.to_string()))
    }

    /// Stable machine-readable kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(err) => match err {
                AuthError::Missing => ErrorKind::AuthMissing,
                AuthError::Invalid => ErrorKind::AuthInvalid,
                AuthError::Timeout => ErrorKind::AuthTimeout,
            },
            Self::Authorization(err) => match err {
                AuthorizationError::NotFriends => ErrorKind::NotFriends,
                AuthorizationError::NotParticipant => ErrorKind::NotParticipant,
                AuthorizationError::NotOwner => ErrorKind::NotOwner,
            },
            Self::Validation(err) => match err {
                ValidationError::MissingField(_) => ErrorKind::MissingField,
                ValidationError::InvalidReference(_) => ErrorKind::InvalidReference,
                ValidationError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            },
            Self::NotFound(err) => match err {
                NotFoundError::User(_) => ErrorKind::UserNotFound,
                NotFoundError::Message(_) => ErrorKind::MessageNotFound,
                NotFoundError::Payload(_) => ErrorKind::PayloadNotFound,
                NotFoundError::Request => ErrorKind::NoSuchRequest,
            },
            Self::Conflict(err) => match err {
                ConflictError::AlreadyFriends => ErrorKind::AlreadyFriends,
                ConflictError::AlreadyRequested => ErrorKind::AlreadyRequested,
                ConflictError::SelfRequest => ErrorKind::SelfRequest,
                ConflictError::UsernameTaken(_) => ErrorKind::UsernameTaken,
            },
            Self::Store(_) => ErrorKind::StoreUnavailable,
            Self::Shared(err) => err.kind(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Auth` - 401 Unauthorized
    /// - `Authorization` - 403 Forbidden
    /// - `Validation` / `Shared` - 400 Bad Request
    /// - `NotFound` - 404 Not Found
    /// - `Conflict` - 409 Conflict
    /// - `Store` - 503 Service Unavailable
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::Shared(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Human-readable reason, safe to show to the client
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("[Store] Database error: {}", err);
        StoreError::Unavailable(err.to_string())
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.into())
    }
}
