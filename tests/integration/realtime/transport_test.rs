//! WebSocket transport tests
//!
//! These serve the full router on a local port and talk to it with a real
//! WebSocket client, covering the handshake and the registry lifecycle.

use std::net::SocketAddr;
use std::time::Duration;

use assert_matches::assert_matches;
use convoflow::shared::{AuthFailure, ErrorKind, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::common::TestApp;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(2);

async fn open(addr: SocketAddr, query: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws{query}"))
        .await
        .expect("upgrade");
    client
}

/// Next text frame, skipping pings
async fn next_text(client: &mut Client) -> String {
    loop {
        let frame = tokio::time::timeout(WAIT, client.next())
            .await
            .expect("frame in time");
        match frame {
            Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

async fn next_event(client: &mut Client) -> ServerEvent {
    serde_json::from_str(&next_text(client).await).expect("server event")
}

async fn expect_auth_failure(client: &mut Client, kind: ErrorKind) {
    let failure: AuthFailure =
        serde_json::from_str(&next_text(client).await).expect("auth failure frame");
    assert_eq!(failure.error, "Authentication error");
    assert_eq!(failure.kind, kind);

    let frame = tokio::time::timeout(WAIT, client.next())
        .await
        .expect("close in time");
    assert_matches!(frame, Some(Ok(Message::Close(Some(close)))) => {
        assert_eq!(close.code, CloseCode::Policy);
    });
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_silent_client_times_out() {
    let app = TestApp::new();
    let addr = app.serve().await;

    let mut client = open(addr, "").await;
    expect_auth_failure(&mut client, ErrorKind::AuthTimeout).await;
    assert_eq!(app.state.registry.connection_count(), 0);
}

#[tokio::test]
async fn test_bad_upgrade_token_is_rejected() {
    let app = TestApp::new();
    let addr = app.serve().await;

    let mut client = open(addr, "?token=garbage").await;
    expect_auth_failure(&mut client, ErrorKind::AuthInvalid).await;
    assert_eq!(app.state.registry.connection_count(), 0);
}

#[tokio::test]
async fn test_first_frame_that_is_not_a_credential_is_rejected() {
    let app = TestApp::new();
    let addr = app.serve().await;

    let mut client = open(addr, "").await;
    client
        .send(Message::Text(json!({ "event": "markMessagesAsSeen" }).to_string().into()))
        .await
        .expect("send");
    expect_auth_failure(&mut client, ErrorKind::AuthMissing).await;
    assert_eq!(app.state.registry.connection_count(), 0);
}

#[tokio::test]
async fn test_first_frame_credential_joins_and_receives_events() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let bo = app.user("bo").await;
    let addr = app.serve().await;

    let mut client = open(addr, "").await;
    client
        .send(Message::Text(json!({ "token": ana.token }).to_string().into()))
        .await
        .expect("send credential");
    wait_until(|| app.state.registry.is_online(ana.id)).await;
    assert_eq!(app.state.registry.connections_for(ana.id).len(), 1);

    client
        .send(Message::Text("not json".into()))
        .await
        .expect("send frame");
    assert_matches!(
        next_event(&mut client).await,
        ServerEvent::Error { kind: ErrorKind::MalformedEvent, .. }
    );

    app.post("/api/friends/request", &bo.token, json!({ "receiverId": ana.id }))
        .await;
    assert_eq!(
        next_event(&mut client).await,
        ServerEvent::FriendRequestReceived { user_id: bo.id, username: "bo".into() }
    );
}

#[tokio::test]
async fn test_close_removes_connection() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let addr = app.serve().await;

    let mut request = format!("ws://{addr}/ws")
        .into_client_request()
        .expect("client request");
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", ana.token).parse().expect("header value"),
    );
    let (mut client, _) = connect_async(request).await.expect("upgrade");
    wait_until(|| app.state.registry.is_online(ana.id)).await;

    client.close(None).await.expect("close");
    wait_until(|| app.state.registry.connection_count() == 0).await;
    assert!(!app.state.registry.is_online(ana.id));
}
