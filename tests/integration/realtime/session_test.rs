//! Messaging session scenarios
//!
//! Each test drives real `SessionHandler`s over an in-memory app and checks
//! what every connection's outbox received.

use assert_matches::assert_matches;
use convoflow::shared::messaging::HistoryQuery;
use convoflow::shared::{ClientEvent, ErrorKind, MessageKind, ServerEvent};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use crate::common::TestApp;
use crate::{assert_err_kind, assert_events, assert_ok};

fn text(receiver_id: Uuid, content: &str) -> ClientEvent {
    ClientEvent::SendMessage {
        receiver_id,
        kind: MessageKind::Text,
        content: Some(content.to_string()),
        payload_id: None,
        duration_ms: None,
    }
}

fn only_message(events: &[ServerEvent]) -> convoflow::shared::Message {
    match events {
        [ServerEvent::ReceiveMessage { message }] => message.clone(),
        other => panic!("expected a single receiveMessage, got {other:?}"),
    }
}

#[tokio::test]
async fn test_strangers_become_friends_then_message() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let bo = app.user("bo").await;
    let mut ana_conn = app.connect(&ana);
    let mut bo_conn = app.connect(&bo);

    // Strangers cannot message
    assert_err_kind!(ana_conn.send(text(bo.id, "hi")).await, ErrorKind::NotFriends);
    match ana_conn.drain().as_slice() {
        [ServerEvent::Error { kind, reason }] => {
            assert_eq!(*kind, ErrorKind::NotFriends);
            assert_eq!(reason, "You can only message friends");
        }
        other => panic!("unexpected events: {other:?}"),
    }
    assert!(bo_conn.drain().is_empty());

    let page = assert_ok!(app.state.messages.history(ana.id, bo.id, HistoryQuery::default()).await);
    assert!(page.messages.is_empty());

    // Friend request over REST, pushed over the registry
    let (status, _) = app
        .post("/api/friends/request", &ana.token, json!({ "receiverId": bo.id }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(
        bo_conn.drain(),
        vec![ServerEvent::FriendRequestReceived { user_id: ana.id, username: "ana".into() }]
    );
    assert_eq!(
        ana_conn.drain(),
        vec![ServerEvent::FriendRequestSent { user_id: bo.id, username: "bo".into() }]
    );

    let (status, _) = app
        .post("/api/friends/accept", &bo.token, json!({ "senderId": ana.id }))
        .await;
    assert_eq!(status, 200);
    assert_events!(ana_conn, ["friendRequestAccepted"]);
    assert_events!(bo_conn, ["friendRequestAccepted"]);

    // Now the message goes through
    assert_ok!(ana_conn.send(text(bo.id, "hi")).await);

    let received = only_message(&bo_conn.drain());
    assert_eq!(received.content, "hi");
    assert_eq!(received.sender_id, ana.id);

    match ana_conn.drain().as_slice() {
        [ServerEvent::MessageAccepted { message }, ServerEvent::MessageDelivered { message_id, delivered_at }] => {
            assert_eq!(message.id, received.id);
            assert_eq!(*message_id, received.id);
            assert!(*delivered_at >= message.created_at);
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[tokio::test]
async fn test_mark_seen_notifies_sender_once() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let bo = app.user("bo").await;
    app.befriend(&ana, &bo).await;
    let mut ana_conn = app.connect(&ana);
    let mut bo_conn = app.connect(&bo);

    assert_ok!(ana_conn.send(text(bo.id, "are you there?")).await);
    let message = only_message(&bo_conn.drain());
    ana_conn.drain();

    assert_ok!(bo_conn.send(ClientEvent::MarkMessagesAsSeen { counterpart_id: ana.id }).await);
    let seen_at = match ana_conn.drain().as_slice() {
        [ServerEvent::MessageSeen { message_id, seen_at }] => {
            assert_eq!(*message_id, message.id);
            *seen_at
        }
        other => panic!("expected one messageSeen, got {other:?}"),
    };

    // Idempotent: nothing new, seen_at unchanged
    assert_ok!(bo_conn.send(ClientEvent::MarkMessagesAsSeen { counterpart_id: ana.id }).await);
    assert!(ana_conn.drain().is_empty());

    let stored = assert_ok!(app.state.messages.get(message.id).await);
    assert_eq!(stored.seen_at, Some(seen_at));
    let delivered_at = stored.delivered_at.expect("delivered");
    assert!(delivered_at >= stored.created_at);
    assert!(seen_at >= delivered_at);
}

#[tokio::test]
async fn test_reaction_by_outsider_is_rejected() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let bo = app.user("bo").await;
    let cy = app.user("cy").await;
    app.befriend(&ana, &bo).await;
    let mut ana_conn = app.connect(&ana);
    let mut bo_conn = app.connect(&bo);
    let mut cy_conn = app.connect(&cy);

    assert_ok!(ana_conn.send(text(bo.id, "just us")).await);
    let message = only_message(&bo_conn.drain());

    let react = ClientEvent::AddReaction { message_id: message.id, emoji: "👍".into() };
    assert_err_kind!(cy_conn.send(react.clone()).await, ErrorKind::NotParticipant);
    assert_matches!(
        cy_conn.drain().as_slice(),
        [ServerEvent::Error { kind: ErrorKind::NotParticipant, .. }]
    );
    assert!(assert_ok!(app.state.messages.get(message.id).await).reactions.is_empty());

    // A participant's reaction reaches both sides
    ana_conn.drain();
    assert_ok!(bo_conn.send(react).await);
    for conn in [&mut ana_conn, &mut bo_conn] {
        match conn.drain().as_slice() {
            [ServerEvent::ReactionAdded { message_id, emoji, user_id, .. }] => {
                assert_eq!(*message_id, message.id);
                assert_eq!(emoji, "👍");
                assert_eq!(*user_id, bo.id);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_forward_only_reaches_friends() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let bo = app.user("bo").await;
    let cy = app.user("cy").await;
    let dee = app.user("dee").await;
    app.befriend(&ana, &bo).await;
    app.befriend(&ana, &cy).await;

    let mut ana_conn = app.connect(&ana);
    let mut bo_conn = app.connect(&bo);
    let mut cy_conn = app.connect(&cy);
    let mut dee_conn = app.connect(&dee);

    assert_ok!(bo_conn.send(text(ana.id, "pass it on")).await);
    let original = only_message(&ana_conn.drain());
    bo_conn.drain();

    assert_ok!(
        ana_conn
            .send(ClientEvent::ForwardMessage {
                message_id: original.id,
                receiver_ids: vec![cy.id, dee.id, cy.id],
            })
            .await
    );

    let copy = only_message(&cy_conn.drain());
    assert_eq!(copy.forwarded_from, Some(original.id));
    assert_eq!(copy.content, "pass it on");
    assert_eq!(copy.sender_id, ana.id);
    assert!(dee_conn.drain().is_empty());

    let events = ana_conn.drain();
    assert_eq!(
        events.last(),
        Some(&ServerEvent::MessageForwarded {
            forwarded_to: vec![cy.id],
            original_message_id: original.id,
        })
    );
    let names: Vec<_> = events.iter().map(ServerEvent::name).collect();
    assert_eq!(names, vec!["messageAccepted", "messageDelivered", "messageForwarded"]);

    let page = assert_ok!(app.state.messages.history(ana.id, dee.id, HistoryQuery::default()).await);
    assert!(page.messages.is_empty());
}

#[tokio::test]
async fn test_forward_to_nobody_acknowledges_empty_list() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let bo = app.user("bo").await;
    let stranger = app.user("stranger").await;
    app.befriend(&ana, &bo).await;
    let mut ana_conn = app.connect(&ana);

    assert_ok!(ana_conn.send(text(bo.id, "hello")).await);
    let message_id = assert_matches!(
        ana_conn.drain().first(),
        Some(ServerEvent::MessageAccepted { message }) => message.id
    );

    let forwarded = assert_ok!(ana_conn.handler.forward(message_id, &[stranger.id]).await);
    assert!(forwarded.is_empty());
    assert_eq!(
        ana_conn.drain(),
        vec![ServerEvent::MessageForwarded { forwarded_to: vec![], original_message_id: message_id }]
    );
}

#[tokio::test]
async fn test_only_sender_may_delete() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let bo = app.user("bo").await;
    app.befriend(&ana, &bo).await;
    let mut ana_conn = app.connect(&ana);
    let mut bo_conn = app.connect(&bo);

    assert_ok!(ana_conn.send(text(bo.id, "regret")).await);
    let message = only_message(&bo_conn.drain());
    ana_conn.drain();

    let delete = ClientEvent::DeleteMessage { message_id: message.id };
    assert_err_kind!(bo_conn.send(delete.clone()).await, ErrorKind::NotOwner);
    assert_events!(bo_conn, ["error"]);
    assert!(ana_conn.drain().is_empty());
    assert!(!assert_ok!(app.state.messages.get(message.id).await).deleted);

    assert_ok!(ana_conn.send(delete).await);
    assert_eq!(ana_conn.drain(), vec![ServerEvent::MessageDeleted { message_id: message.id }]);
    assert_eq!(bo_conn.drain(), vec![ServerEvent::MessageDeleted { message_id: message.id }]);

    let page = assert_ok!(app.state.messages.history(ana.id, bo.id, HistoryQuery::default()).await);
    assert!(page.messages.is_empty());
}

#[tokio::test]
async fn test_every_connection_of_a_user_receives() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let bo = app.user("bo").await;
    app.befriend(&ana, &bo).await;
    let mut phone = app.connect(&ana);
    let mut laptop = app.connect(&ana);
    let mut bo_conn = app.connect(&bo);

    assert_ok!(bo_conn.send(text(ana.id, "ping")).await);
    assert_events!(phone, ["receiveMessage"]);
    assert_events!(laptop, ["receiveMessage"]);

    // Errors stay on the connection that caused them
    assert_err_kind!(phone.send(text(Uuid::new_v4(), "nobody")).await, ErrorKind::NotFriends);
    assert_events!(phone, ["error"]);
    assert!(laptop.drain().is_empty());

    // After a disconnect only the remaining connection receives
    app.disconnect(phone);
    assert_ok!(bo_conn.send(text(ana.id, "pong")).await);
    assert_events!(laptop, ["receiveMessage"]);
}

#[tokio::test]
async fn test_offline_receiver_still_gets_history() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let bo = app.user("bo").await;
    app.befriend(&ana, &bo).await;
    let mut ana_conn = app.connect(&ana);

    assert_ok!(ana_conn.send(text(bo.id, "while you were out")).await);
    assert_events!(ana_conn, ["messageAccepted", "messageDelivered"]);

    let (status, body) = app.get(&format!("/api/messages/{}", ana.id), Some(&bo.token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["messages"][0]["content"], "while you were out");
    assert_eq!(body["hasMore"], false);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_usable() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let bo = app.user("bo").await;
    app.befriend(&ana, &bo).await;
    let mut ana_conn = app.connect(&ana);

    assert!(ana_conn.handler.handle_frame(r#"{"event":"teleport","data":{}}"#).await.is_err());
    assert_matches!(
        ana_conn.drain().as_slice(),
        [ServerEvent::Error { kind: ErrorKind::MalformedEvent, .. }]
    );

    let frame = json!({ "event": "sendMessage", "data": { "receiverId": bo.id, "content": "still here" } });
    assert_ok!(ana_conn.handler.handle_frame(&frame.to_string()).await);
    assert_events!(ana_conn, ["messageAccepted", "messageDelivered"]);
}
