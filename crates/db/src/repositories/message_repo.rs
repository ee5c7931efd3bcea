//! Repository for the `messages` table.
//!
//! The message log is append-only. Reads are always ascending
//! `(created_at, id)`; that pair is the authoritative total order within
//! a conversation (the id breaks creation-timestamp ties in insertion
//! order).

use sqlx::PgPool;
use tradepost_core::types::{DbId, Timestamp};

use crate::models::message::Message;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, conversation_id, sender_id, content, status, created_at";

/// Provides append and ordered-read operations for messages.
pub struct MessageRepo;

impl MessageRepo {
    /// Append a message to a conversation's log, returning the persisted
    /// row. `created_at` is assigned by the database at insert time.
    ///
    /// Participant membership is enforced on the request path before this
    /// runs; at this layer a dangling `conversation_id` surfaces as a
    /// foreign-key error.
    pub async fn append(
        pool: &PgPool,
        conversation_id: DbId,
        sender_id: DbId,
        content: &str,
    ) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages (conversation_id, sender_id, content)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(sender_id)
            .bind(content)
            .fetch_one(pool)
            .await
    }

    /// Full message history of a conversation, ascending by
    /// `(created_at, id)`.
    pub async fn list_by_conversation(
        pool: &PgPool,
        conversation_id: DbId,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE conversation_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .fetch_all(pool)
            .await
    }

    /// Find one message by id within a conversation.
    pub async fn find_in_conversation(
        pool: &PgPool,
        conversation_id: DbId,
        message_id: DbId,
    ) -> Result<Option<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE conversation_id = $1 AND id = $2"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(message_id)
            .fetch_optional(pool)
            .await
    }

    /// Keyset page of a conversation's history: messages strictly after
    /// the `(created_at, id)` cursor, ascending, at most `limit` rows.
    pub async fn list_page(
        pool: &PgPool,
        conversation_id: DbId,
        after: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        match after {
            Some((created_at, id)) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM messages
                     WHERE conversation_id = $1 AND (created_at, id) > ($2, $3)
                     ORDER BY created_at ASC, id ASC
                     LIMIT $4"
                );
                sqlx::query_as::<_, Message>(&query)
                    .bind(conversation_id)
                    .bind(created_at)
                    .bind(id)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM messages
                     WHERE conversation_id = $1
                     ORDER BY created_at ASC, id ASC
                     LIMIT $2"
                );
                sqlx::query_as::<_, Message>(&query)
                    .bind(conversation_id)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
        }
    }
}
