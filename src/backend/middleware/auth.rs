/**
 * Authentication Extractor
 *
 * This module provides the extractor for routes that require user
 * authentication. It reads the JWT from the `Authorization: Bearer` header,
 * verifies it with the application's `JwtVerifier`, and hands the user id to
 * the handler. Missing or invalid credentials are rejected with 401 and the
 * standard JSON error body.
 */
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::backend::auth::{bearer_token, JwtVerifier};
use crate::backend::error::BackendError;

/// Authenticated user data extracted from JWT token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Axum extractor for authenticated user
///
/// Works with any state that exposes an `Arc<JwtVerifier>` through `FromRef`.
///
/// ```rust,ignore
/// async fn handler(AuthUser(user): AuthUser) -> String {
///     user.user_id.to_string()
/// }
/// ```
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.user_id
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtVerifier>: FromRef<S>,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);

        let claims = verifier
            .verify_claims(bearer_token(&parts.headers))
            .map_err(|e| {
                tracing::warn!("[Auth] Rejected request to {}: {}", parts.uri.path(), e);
                e
            })?;
        let user_id = claims.user_id()?;

        Ok(AuthUser(AuthenticatedUser { user_id }))
    }
}
