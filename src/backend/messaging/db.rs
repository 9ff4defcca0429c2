//! Database operations for messaging
//!
//! PostgreSQL implementation of the message store. Every mutation is a
//! single conditional statement (`UPDATE ... WHERE <precondition> RETURNING`
//! or `INSERT ... SELECT ... WHERE <precondition>`), so the check and the
//! write happen atomically for the row. When the statement matches nothing,
//! the row is read back only to pick the right error.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::MessageStore;
use crate::backend::error::{AuthorizationError, BackendResult, NotFoundError};
use crate::shared::messaging::{
    HistoryPage, HistoryQuery, Message, MessageKind, NewMessage, Reaction, SeenReceipt,
};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, kind, content, duration_ms, \
     created_at, delivered_at, seen_at, forwarded_from, deleted";

/// Message store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load reactions for the given messages, in insertion order
    async fn attach_reactions(&self, messages: &mut [Message]) -> BackendResult<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = messages.iter().map(|m| m.id).collect();
        let rows = sqlx::query(
            r#"
            SELECT message_id, user_id, emoji, created_at
            FROM message_reactions
            WHERE message_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_message: HashMap<Uuid, Vec<Reaction>> = HashMap::new();
        for row in rows {
            by_message
                .entry(row.try_get("message_id")?)
                .or_default()
                .push(Reaction {
                    emoji: row.try_get("emoji")?,
                    user_id: row.try_get("user_id")?,
                    timestamp: row.try_get("created_at")?,
                });
        }
        for message in messages.iter_mut() {
            message.reactions = by_message.remove(&message.id).unwrap_or_default();
        }
        Ok(())
    }

    fn seen_receipts(rows: Vec<PgRow>) -> BackendResult<Vec<SeenReceipt>> {
        rows.iter()
            .map(|row| -> BackendResult<SeenReceipt> {
                Ok(SeenReceipt {
                    message_id: row.try_get("id")?,
                    sender_id: row.try_get("sender_id")?,
                    seen_at: row.try_get("seen_at")?,
                })
            })
            .collect()
    }
}

/// Map a `messages` row; reactions are loaded separately
fn message_from_row(row: &PgRow) -> Result<Message, sqlx::Error> {
    let kind: String = row.try_get("kind")?;
    let duration_ms: Option<i32> = row.try_get("duration_ms")?;
    Ok(Message {
        id: row.try_get("id")?,
        sender_id: row.try_get("sender_id")?,
        receiver_id: row.try_get("receiver_id")?,
        kind: MessageKind::from_str(&kind).unwrap_or_default(),
        content: row.try_get("content")?,
        duration_ms: duration_ms.map(|d| d.max(0) as u32),
        created_at: row.try_get("created_at")?,
        delivered_at: row.try_get("delivered_at")?,
        seen_at: row.try_get("seen_at")?,
        reactions: Vec::new(),
        forwarded_from: row.try_get("forwarded_from")?,
        deleted: row.try_get("deleted")?,
    })
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn create(&self, new: NewMessage) -> BackendResult<Message> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, kind, content, duration_ms, created_at, forwarded_from)
            VALUES ($1, $2, $3, $4, $5, $6, now(), $7)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(new.sender_id)
        .bind(new.receiver_id)
        .bind(new.kind.as_str())
        .bind(&new.content)
        .bind(new.duration_ms.map(|d| d.min(i32::MAX as u32) as i32))
        .bind(new.forwarded_from)
        .fetch_one(&self.pool)
        .await?;

        let message = message_from_row(&row)?;
        tracing::debug!(
            "[Messages] Stored {} ({}) {} -> {}",
            message.id,
            message.kind.as_str(),
            message.sender_id,
            message.receiver_id
        );
        Ok(message)
    }

    async fn get(&self, id: Uuid) -> BackendResult<Message> {
        let row = sqlx::query(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(NotFoundError::Message(id))?;

        let mut messages = [message_from_row(&row)?];
        self.attach_reactions(&mut messages).await?;
        let [message] = messages;
        Ok(message)
    }

    async fn mark_delivered(&self, id: Uuid) -> BackendResult<DateTime<Utc>> {
        let updated: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE messages SET delivered_at = GREATEST(now(), created_at)
            WHERE id = $1 AND delivered_at IS NULL
            RETURNING delivered_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(delivered_at) = updated {
            return Ok(delivered_at);
        }

        let existing: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT delivered_at FROM messages WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        existing.flatten().ok_or_else(|| NotFoundError::Message(id).into())
    }

    async fn mark_seen(&self, ids: &[Uuid], reader: Uuid) -> BackendResult<Vec<SeenReceipt>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            r#"
            WITH updated AS (
                UPDATE messages
                SET delivered_at = COALESCE(delivered_at, GREATEST(now(), created_at)),
                    seen_at = GREATEST(now(), COALESCE(delivered_at, created_at))
                WHERE id = ANY($1) AND receiver_id = $2 AND seen_at IS NULL AND NOT deleted
                RETURNING id, sender_id, seen_at, seq
            )
            SELECT id, sender_id, seen_at FROM updated ORDER BY seq
            "#,
        )
        .bind(ids.to_vec())
        .bind(reader)
        .fetch_all(&self.pool)
        .await?;

        Self::seen_receipts(rows)
    }

    async fn mark_seen_from(&self, counterpart: Uuid, reader: Uuid) -> BackendResult<Vec<SeenReceipt>> {
        let rows = sqlx::query(
            r#"
            WITH updated AS (
                UPDATE messages
                SET delivered_at = COALESCE(delivered_at, GREATEST(now(), created_at)),
                    seen_at = GREATEST(now(), COALESCE(delivered_at, created_at))
                WHERE sender_id = $1 AND receiver_id = $2 AND seen_at IS NULL AND NOT deleted
                RETURNING id, sender_id, seen_at, seq
            )
            SELECT id, sender_id, seen_at FROM updated ORDER BY seq
            "#,
        )
        .bind(counterpart)
        .bind(reader)
        .fetch_all(&self.pool)
        .await?;

        Self::seen_receipts(rows)
    }

    async fn add_reaction(&self, id: Uuid, emoji: &str, reactor: Uuid) -> BackendResult<Reaction> {
        let inserted: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            INSERT INTO message_reactions (message_id, user_id, emoji, created_at)
            SELECT id, $2, $3, now() FROM messages
            WHERE id = $1 AND NOT deleted AND (sender_id = $2 OR receiver_id = $2)
            RETURNING created_at
            "#,
        )
        .bind(id)
        .bind(reactor)
        .bind(emoji)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(timestamp) => Ok(Reaction {
                emoji: emoji.to_string(),
                user_id: reactor,
                timestamp,
            }),
            None => {
                let message = self.get(id).await?;
                if !message.is_participant(reactor) {
                    Err(AuthorizationError::NotParticipant.into())
                } else {
                    Err(NotFoundError::Message(id).into())
                }
            }
        }
    }

    async fn soft_delete(&self, id: Uuid, requester: Uuid) -> BackendResult<Message> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE messages SET deleted = TRUE
            WHERE id = $1 AND sender_id = $2 AND NOT deleted
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(requester)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut messages = [message_from_row(&row)?];
                self.attach_reactions(&mut messages).await?;
                let [message] = messages;
                Ok(message)
            }
            None => {
                let message = self.get(id).await?;
                if message.sender_id != requester {
                    Err(AuthorizationError::NotOwner.into())
                } else {
                    Err(NotFoundError::Message(id).into())
                }
            }
        }
    }

    async fn history(&self, a: Uuid, b: Uuid, query: HistoryQuery) -> BackendResult<HistoryPage> {
        let limit = query.effective_limit();
        let offset = query.effective_offset();

        let rows = sqlx::query(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE NOT deleted
              AND ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1))
            ORDER BY created_at, seq
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(a)
        .bind(b)
        .bind(limit as i64 + 1)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let has_more = rows.len() > limit;
        let mut messages = rows
            .iter()
            .take(limit)
            .map(message_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_reactions(&mut messages).await?;

        Ok(HistoryPage { messages, has_more })
    }
}
