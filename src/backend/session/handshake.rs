//! Connection handshake
//!
//! A client authenticates either on the upgrade request (`?token=` or
//! `Authorization: Bearer`) or by sending `{"token": "..."}` as its first
//! frame. The first-frame path is bounded by the handshake timeout.

use std::time::Duration;

use axum::extract::ws::Message as WsMessage;
use futures_util::{Stream, StreamExt};
use uuid::Uuid;

use crate::backend::auth::JwtVerifier;
use crate::backend::error::AuthError;
use crate::shared::AuthFrame;

/// Read the credential from the first frame of `stream`
///
/// Ping/pong frames are skipped. A close frame, a transport error or a first
/// frame that is not `{"token": ...}` count as a missing credential.
pub async fn await_credential<S>(stream: &mut S, timeout: Duration) -> Result<String, AuthError>
where
    S: Stream<Item = Result<WsMessage, axum::Error>> + Unpin,
{
    match tokio::time::timeout(timeout, first_token(stream)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("[Session] No credential within {:?}", timeout);
            Err(AuthError::Timeout)
        }
    }
}

async fn first_token<S>(stream: &mut S) -> Result<String, AuthError>
where
    S: Stream<Item = Result<WsMessage, axum::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => return parse_auth_frame(text.as_str().as_bytes()),
            Ok(WsMessage::Binary(bytes)) => return parse_auth_frame(&bytes),
            Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => continue,
            Ok(WsMessage::Close(_)) => return Err(AuthError::Missing),
            Err(e) => {
                tracing::debug!("[Session] Transport error during handshake: {}", e);
                return Err(AuthError::Missing);
            }
        }
    }
    Err(AuthError::Missing)
}

fn parse_auth_frame(raw: &[u8]) -> Result<String, AuthError> {
    serde_json::from_slice::<AuthFrame>(raw)
        .map(|frame| frame.token)
        .map_err(|_| AuthError::Missing)
}

/// Resolve the connecting user
///
/// Uses the credential presented on upgrade when there is one, otherwise
/// waits for the first frame.
pub async fn authenticate<S>(
    verifier: &JwtVerifier,
    presented: Option<String>,
    stream: &mut S,
    timeout: Duration,
) -> Result<Uuid, AuthError>
where
    S: Stream<Item = Result<WsMessage, axum::Error>> + Unpin,
{
    let token = match presented.filter(|token| !token.is_empty()) {
        Some(token) => token,
        None => await_credential(stream, timeout).await?,
    };
    verifier.verify(Some(&token))
}
