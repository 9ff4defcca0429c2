/**
 * Identity Verification and JWT Tokens
 *
 * This module validates bearer credentials and extracts the stable user
 * identity used by every connection handshake and every REST call.
 *
 * Tokens are HS256 JWTs. Verification checks signature and expiry; a token
 * whose `sub` is not a UUID is treated as invalid. Issuing tokens belongs to
 * the external credential service, `issue` exists for it and for tests.
 */
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::AuthError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Username (optional, informational only)
    #[serde(default)]
    pub username: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::Invalid)
    }
}

/// Validates bearer credentials with a shared secret
#[derive(Clone)]
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Verify a credential and return the user it identifies
    ///
    /// # Arguments
    /// * `credential` - Raw token, `None` if the client presented nothing
    ///
    /// # Returns
    /// * `AuthError::Missing` - no credential, or an empty one
    /// * `AuthError::Invalid` - bad signature, expired, malformed, or non-UUID subject
    pub fn verify(&self, credential: Option<&str>) -> Result<Uuid, AuthError> {
        self.verify_claims(credential)?.user_id()
    }

    /// Verify a credential and return its full claims
    pub fn verify_claims(&self, credential: Option<&str>) -> Result<Claims, AuthError> {
        let token = match credential.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AuthError::Missing),
        };

        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!("[Auth] Token rejected: {}", e);
            AuthError::Invalid
        })?;
        Ok(data.claims)
    }

    /// Create a token for `user_id` that expires after `ttl`
    ///
    /// A negative `ttl` yields an already-expired token.
    pub fn issue(
        &self,
        user_id: Uuid,
        username: Option<&str>,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.map(str::to_string),
            exp: (now + ttl).timestamp().max(0) as u64,
            iat: now.timestamp().max(0) as u64,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }
}
