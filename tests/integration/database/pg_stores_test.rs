//! Postgres store tests
//!
//! These need a live database:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/convoflow_test cargo test -- --ignored
//! ```

use convoflow::backend::graph::{PgGraphStore, SocialGraphStore};
use convoflow::backend::messaging::{MessageStore, PgMessageStore};
use convoflow::shared::messaging::{FriendRequestStatus, HistoryQuery, NewMessage};
use convoflow::shared::ErrorKind;
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{assert_err_kind, assert_ok};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.expect("Failed to connect");
    sqlx::migrate!().run(&pool).await.expect("Failed to migrate");
    pool
}

fn unique(name: &str) -> String {
    format!("{name}-{}", Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_pg_friend_lifecycle() {
    let graph = PgGraphStore::new(pool().await);
    let ana = assert_ok!(graph.register_user(&unique("ana")).await);
    let bo = assert_ok!(graph.register_user(&unique("bo")).await);

    assert_err_kind!(graph.register_user(&ana.username).await, ErrorKind::UsernameTaken);
    assert_err_kind!(graph.send_request(ana.id, ana.id).await, ErrorKind::SelfRequest);
    assert_err_kind!(graph.accept_request(ana.id, bo.id).await, ErrorKind::NoSuchRequest);
    assert_err_kind!(graph.relation(ana.id, Uuid::new_v4()).await, ErrorKind::UserNotFound);
    assert_err_kind!(graph.relation(Uuid::new_v4(), bo.id).await, ErrorKind::UserNotFound);

    assert_ok!(graph.send_request(ana.id, bo.id).await);
    assert_eq!(assert_ok!(graph.relation(ana.id, bo.id).await), FriendRequestStatus::PendingSent);
    assert_eq!(assert_ok!(graph.relation(bo.id, ana.id).await), FriendRequestStatus::PendingReceived);
    assert_err_kind!(graph.send_request(bo.id, ana.id).await, ErrorKind::AlreadyRequested);

    assert_ok!(graph.accept_request(ana.id, bo.id).await);
    assert!(assert_ok!(graph.are_friends(bo.id, ana.id).await));
    assert!(assert_ok!(graph.friends_of(ana.id).await).contains(&bo.id));
    assert_err_kind!(graph.send_request(ana.id, bo.id).await, ErrorKind::AlreadyFriends);

    let view = assert_ok!(graph.list_relations(ana.id).await);
    assert!(view.is_friend(bo.id));
    assert!(view.stranger(bo.id).is_none());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_pg_message_lifecycle() {
    let pool = pool().await;
    let graph = PgGraphStore::new(pool.clone());
    let store = PgMessageStore::new(pool);
    let ana = assert_ok!(graph.register_user(&unique("ana")).await).id;
    let bo = assert_ok!(graph.register_user(&unique("bo")).await).id;

    let first = assert_ok!(store.create(NewMessage::text(ana, bo, "first")).await);
    let second = assert_ok!(store.create(NewMessage::text(bo, ana, "second")).await);

    let delivered_at = assert_ok!(store.mark_delivered(first.id).await);
    assert!(delivered_at >= first.created_at);

    let receipts = assert_ok!(store.mark_seen_from(ana, bo).await);
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].message_id, first.id);
    assert!(assert_ok!(store.mark_seen_from(ana, bo).await).is_empty());

    let reaction = assert_ok!(store.add_reaction(first.id, "🔥", bo).await);
    assert_eq!(reaction.user_id, bo);
    let outsider = Uuid::new_v4();
    assert_err_kind!(store.add_reaction(first.id, "🔥", outsider).await, ErrorKind::NotParticipant);

    assert_err_kind!(store.soft_delete(second.id, ana).await, ErrorKind::NotOwner);
    assert_ok!(store.soft_delete(second.id, bo).await);
    assert_err_kind!(store.soft_delete(second.id, bo).await, ErrorKind::MessageNotFound);

    let page = assert_ok!(store.history(ana, bo, HistoryQuery::default()).await);
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].id, first.id);
    assert_eq!(page.messages[0].reactions.len(), 1);
    assert!(!page.has_more);
}
