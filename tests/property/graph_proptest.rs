//! Property-based tests for the friend graph
//!
//! Replays arbitrary request/accept sequences and checks the relation
//! invariants after every step.

use convoflow::backend::graph::{MemoryGraphStore, SocialGraphStore};
use convoflow::shared::messaging::FriendRequestStatus;
use proptest::prelude::*;
use uuid::Uuid;

const USERS: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    Request(usize, usize),
    Accept(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..USERS, 0..USERS).prop_map(|(a, b)| Op::Request(a, b)),
        (0..USERS, 0..USERS).prop_map(|(a, b)| Op::Accept(a, b)),
    ]
}

fn mirrored(status: FriendRequestStatus) -> FriendRequestStatus {
    match status {
        FriendRequestStatus::PendingSent => FriendRequestStatus::PendingReceived,
        FriendRequestStatus::PendingReceived => FriendRequestStatus::PendingSent,
        other => other,
    }
}

async fn check(graph: &MemoryGraphStore, users: &[Uuid]) -> Result<(), TestCaseError> {
    for &a in users {
        let view = graph.list_relations(a).await.unwrap();
        prop_assert!(!view.is_friend(a));
        prop_assert!(view.stranger(a).is_none());

        for &b in users.iter().filter(|&&b| b != a) {
            let forward = graph.relation(a, b).await.unwrap();
            let backward = graph.relation(b, a).await.unwrap();
            prop_assert_eq!(mirrored(forward), backward);

            let friends = graph.are_friends(a, b).await.unwrap();
            prop_assert_eq!(friends, graph.are_friends(b, a).await.unwrap());
            prop_assert_eq!(friends, forward == FriendRequestStatus::Friends);

            // Friends are never strangers, strangers never friends
            prop_assert_eq!(view.is_friend(b), friends);
            prop_assert_eq!(view.stranger(b).is_some(), !friends);
            if let Some(entry) = view.stranger(b) {
                prop_assert!(!(entry.sent_pending && entry.received_pending));
                prop_assert_eq!(entry.sent_pending, forward == FriendRequestStatus::PendingSent);
            }
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_relations_stay_consistent(ops in prop::collection::vec(op(), 0..24)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let graph = MemoryGraphStore::new();
            let mut users = Vec::with_capacity(USERS);
            for i in 0..USERS {
                users.push(graph.register_user(&format!("user{i}")).await.unwrap().id);
            }

            for op in ops {
                match op {
                    Op::Request(a, b) => {
                        let before = graph.relation(users[a], users[b]).await.unwrap();
                        let result = graph.send_request(users[a], users[b]).await;
                        prop_assert_eq!(
                            result.is_ok(),
                            a != b && before == FriendRequestStatus::None
                        );
                    }
                    Op::Accept(a, b) => {
                        let before = graph.relation(users[a], users[b]).await.unwrap();
                        let result = graph.accept_request(users[a], users[b]).await;
                        prop_assert_eq!(
                            result.is_ok(),
                            a != b && before == FriendRequestStatus::PendingSent
                        );
                    }
                }
                check(&graph, &users).await?;
            }
            Ok(())
        })?;
    }
}
