/**
 * WebSocket Transport
 *
 * `GET /ws` upgrades to a WebSocket and runs one messaging session on it.
 *
 * # Lifecycle
 *
 * 1. Authenticate (upgrade credential, or first frame within the timeout)
 * 2. On failure: send `{"error": "Authentication error", ...}`, close, stop.
 *    The connection never enters the registry.
 * 3. Join the registry and spawn a writer task draining the outbox
 * 4. Read frames one at a time and hand them to the session handler, so a
 *    connection's events are processed in arrival order
 * 5. On close (either side) leave the registry
 */
use axum::extract::ws::{close_code, CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::{Sink, SinkExt, StreamExt};
use serde::Deserialize;

use crate::backend::auth::bearer_token;
use crate::backend::error::AuthError;
use crate::backend::server::state::AppState;
use crate::backend::session::handler::SessionHandler;
use crate::backend::session::handshake;
use crate::backend::session::state::SessionState;
use crate::shared::{AuthFailure, ErrorKind};

/// Query parameters of the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Handle a WebSocket upgrade (GET /ws)
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let presented = params
        .token
        .or_else(|| bearer_token(&headers).map(str::to_string));
    tracing::debug!(
        "[Session] Upgrade request (credential on upgrade: {})",
        presented.is_some()
    );
    ws.on_upgrade(move |socket| run_session(state, presented, socket))
}

async fn run_session(state: AppState, presented: Option<String>, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    let mut session = SessionState::default();

    let user_id = match handshake::authenticate(
        &state.verifier,
        presented,
        &mut stream,
        state.config.handshake_timeout(),
    )
    .await
    {
        Ok(user_id) => user_id,
        Err(err) => {
            tracing::warn!("[Session] Handshake rejected: {}", err);
            reject(&mut sink, &err).await;
            session.close();
            return;
        }
    };

    let (connection_id, mut outbox) = state.registry.join(user_id);
    session.authenticate(user_id, connection_id);
    let handler = SessionHandler::new(&state, user_id, connection_id);

    let mut writer = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let frame = match event.encode() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("[Session] Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if sink.send(WsMessage::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) if session.accepts_events() => {
                    let _ = handler.handle_frame(text.as_str()).await;
                }
                Some(Ok(WsMessage::Binary(bytes))) if session.accepts_events() => {
                    let frame = String::from_utf8_lossy(&bytes);
                    let _ = handler.handle_frame(&frame).await;
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("[Session] Transport error on {}: {}", connection_id, e);
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    state.registry.leave(connection_id);
    session.close();
    writer.abort();
    tracing::info!("[Session] {} disconnected ({})", user_id, connection_id);
}

/// Tell the client why the handshake failed, then close
async fn reject<S>(sink: &mut S, err: &AuthError)
where
    S: Sink<WsMessage> + Unpin,
{
    let kind = match err {
        AuthError::Missing => ErrorKind::AuthMissing,
        AuthError::Invalid => ErrorKind::AuthInvalid,
        AuthError::Timeout => ErrorKind::AuthTimeout,
    };
    let failure = AuthFailure::new(kind, err.to_string());

    if let Ok(frame) = serde_json::to_string(&failure) {
        let _ = sink.send(WsMessage::Text(frame.into())).await;
    }
    let _ = sink
        .send(WsMessage::Close(Some(CloseFrame {
            code: close_code::POLICY,
            reason: "Authentication error".into(),
        })))
        .await;
}
