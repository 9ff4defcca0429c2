//! PostgreSQL social graph
//!
//! Relations live in two tables: `friend_requests` (one row per pending
//! request, sender → receiver) and `friendships` (two rows per friendship, one
//! per direction). Each mutation runs in a single transaction that first locks
//! both user rows with `SELECT ... ORDER BY id FOR UPDATE`. Locking in id
//! order means two transactions on the same pair queue behind each other
//! instead of deadlocking, and the checks that follow see committed state.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::SocialGraphStore;
use crate::backend::error::{BackendResult, ConflictError, NotFoundError};
use crate::shared::messaging::{FriendRequestStatus, RelationsView, StrangerEntry, UserProfile};

/// Social graph backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgGraphStore {
    pool: PgPool,
}

impl PgGraphStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock both user rows in id order, failing if either is unknown
    async fn lock_pair(
        tx: &mut Transaction<'_, Postgres>,
        a: Uuid,
        b: Uuid,
    ) -> BackendResult<()> {
        let locked: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(vec![a, b])
                .fetch_all(&mut **tx)
                .await?;

        for id in [a, b] {
            if !locked.contains(&id) {
                return Err(NotFoundError::User(id).into());
            }
        }
        Ok(())
    }

    async fn status_in(
        tx: &mut Transaction<'_, Postgres>,
        a: Uuid,
        b: Uuid,
    ) -> BackendResult<FriendRequestStatus> {
        let row = sqlx::query(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM friendships WHERE user_id = $1 AND friend_id = $2) AS friends,
                EXISTS(SELECT 1 FROM friend_requests WHERE sender_id = $1 AND receiver_id = $2) AS sent,
                EXISTS(SELECT 1 FROM friend_requests WHERE sender_id = $2 AND receiver_id = $1) AS received
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&mut **tx)
        .await?;

        Ok(status_from_flags(
            row.try_get("friends")?,
            row.try_get("sent")?,
            row.try_get("received")?,
        ))
    }
}

fn status_from_flags(friends: bool, sent: bool, received: bool) -> FriendRequestStatus {
    if friends {
        FriendRequestStatus::Friends
    } else if sent {
        FriendRequestStatus::PendingSent
    } else if received {
        FriendRequestStatus::PendingReceived
    } else {
        FriendRequestStatus::None
    }
}

#[async_trait]
impl SocialGraphStore for PgGraphStore {
    async fn register_user(&self, username: &str) -> BackendResult<UserProfile> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, username, created_at)
            VALUES ($1, $2, now())
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| ConflictError::UsernameTaken(username.to_string()))?;
        Ok(UserProfile {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn profile(&self, user_id: Uuid) -> BackendResult<UserProfile> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(NotFoundError::User(user_id))?;

        Ok(UserProfile {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn are_friends(&self, a: Uuid, b: Uuid) -> BackendResult<bool> {
        let friends: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM friendships WHERE user_id = $1 AND friend_id = $2)",
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;
        Ok(friends)
    }

    async fn friends_of(&self, user_id: Uuid) -> BackendResult<Vec<Uuid>> {
        self.profile(user_id).await?;
        let mut friends: Vec<Uuid> =
            sqlx::query_scalar("SELECT friend_id FROM friendships WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        friends.sort();
        Ok(friends)
    }

    async fn relation(&self, a: Uuid, b: Uuid) -> BackendResult<FriendRequestStatus> {
        self.profile(a).await?;
        self.profile(b).await?;
        let mut tx = self.pool.begin().await?;
        let status = Self::status_in(&mut tx, a, b).await?;
        tx.commit().await?;
        Ok(status)
    }

    async fn send_request(&self, sender: Uuid, receiver: Uuid) -> BackendResult<()> {
        if sender == receiver {
            return Err(ConflictError::SelfRequest.into());
        }

        let mut tx = self.pool.begin().await?;
        Self::lock_pair(&mut tx, sender, receiver).await?;

        match Self::status_in(&mut tx, sender, receiver).await? {
            FriendRequestStatus::Friends => return Err(ConflictError::AlreadyFriends.into()),
            FriendRequestStatus::PendingSent | FriendRequestStatus::PendingReceived => {
                return Err(ConflictError::AlreadyRequested.into())
            }
            FriendRequestStatus::None => {}
        }

        sqlx::query(
            "INSERT INTO friend_requests (sender_id, receiver_id, created_at) VALUES ($1, $2, now())",
        )
        .bind(sender)
        .bind(receiver)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!("[Graph] Request pending {} -> {}", sender, receiver);
        Ok(())
    }

    async fn accept_request(&self, sender: Uuid, receiver: Uuid) -> BackendResult<()> {
        if sender == receiver {
            return Err(ConflictError::SelfRequest.into());
        }

        let mut tx = self.pool.begin().await?;
        Self::lock_pair(&mut tx, sender, receiver).await?;

        if Self::status_in(&mut tx, sender, receiver).await? != FriendRequestStatus::PendingSent {
            tx.rollback().await?;
            return Err(NotFoundError::Request.into());
        }

        sqlx::query(
            r#"
            DELETE FROM friend_requests
            WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)
            "#,
        )
        .bind(sender)
        .bind(receiver)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO friendships (user_id, friend_id, created_at)
            VALUES ($1, $2, now()), ($2, $1, now())
            "#,
        )
        .bind(sender)
        .bind(receiver)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!("[Graph] {} and {} are now friends", sender, receiver);
        Ok(())
    }

    async fn list_relations(&self, user_id: Uuid) -> BackendResult<RelationsView> {
        self.profile(user_id).await?;

        let rows = sqlx::query(
            r#"
            SELECT u.id, u.username,
                EXISTS(SELECT 1 FROM friendships f WHERE f.user_id = $1 AND f.friend_id = u.id) AS is_friend,
                EXISTS(SELECT 1 FROM friend_requests r WHERE r.sender_id = $1 AND r.receiver_id = u.id) AS sent_pending,
                EXISTS(SELECT 1 FROM friend_requests r WHERE r.sender_id = u.id AND r.receiver_id = $1) AS received_pending
            FROM users u
            WHERE u.id <> $1
            ORDER BY u.username
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut view = RelationsView::default();
        for row in rows {
            let id: Uuid = row.try_get("id")?;
            if row.try_get::<bool, _>("is_friend")? {
                view.friends.push(id);
            } else {
                view.strangers.push(StrangerEntry {
                    user_id: id,
                    username: row.try_get("username")?,
                    sent_pending: row.try_get("sent_pending")?,
                    received_pending: row.try_get("received_pending")?,
                });
            }
        }
        view.friends.sort();
        Ok(view)
    }
}
