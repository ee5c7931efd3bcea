//! Repository for the `conversations` table.

use sqlx::PgPool;
use tradepost_core::types::DbId;

use crate::models::conversation::{Conversation, ConversationPreview};
use crate::models::message::Message;
use crate::models::product::ProductSummary;
use crate::models::user::PublicProfile;
use crate::repositories::MessageRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, product_id, sender_id, receiver_id, created_at";

/// Provides lookup and idempotent-create operations for conversations.
pub struct ConversationRepo;

impl ConversationRepo {
    /// Resolve the single conversation for a `(product, sender, receiver)`
    /// triple, creating it if absent.
    ///
    /// Concurrent duplicate opens are settled by the unique constraint:
    /// the insert uses `ON CONFLICT DO NOTHING` and the follow-up select
    /// returns whichever row won, so both racers observe the same id.
    pub async fn find_or_create(
        pool: &PgPool,
        product_id: DbId,
        sender_id: DbId,
        receiver_id: DbId,
    ) -> Result<Conversation, sqlx::Error> {
        let insert = format!(
            "INSERT INTO conversations (product_id, sender_id, receiver_id)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_conversations_product_sender_receiver DO NOTHING
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Conversation>(&insert)
            .bind(product_id)
            .bind(sender_id)
            .bind(receiver_id)
            .fetch_optional(pool)
            .await?;

        if let Some(conversation) = inserted {
            return Ok(conversation);
        }

        let select = format!(
            "SELECT {COLUMNS} FROM conversations
             WHERE product_id = $1 AND sender_id = $2 AND receiver_id = $3"
        );
        sqlx::query_as::<_, Conversation>(&select)
            .bind(product_id)
            .bind(sender_id)
            .bind(receiver_id)
            .fetch_one(pool)
            .await
    }

    /// Find a conversation by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Conversation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM conversations WHERE id = $1");
        sqlx::query_as::<_, Conversation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every conversation the user participates in, as sender or
    /// receiver, most recently created first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Conversation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM conversations
             WHERE sender_id = $1 OR receiver_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// List the user's conversations joined with product summary, both
    /// participants' public profiles, and message history for previews.
    ///
    /// Ordered by most recent activity (latest message, falling back to
    /// conversation creation) so active threads float to the top.
    pub async fn list_previews_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ConversationPreview>, sqlx::Error> {
        let conversations = Self::list_for_user(pool, user_id).await?;

        let mut previews = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            // A conversation always references live rows: the FK cascade
            // removes it together with its product or either participant.
            let product = sqlx::query_as::<_, ProductSummary>(
                "SELECT id, name, description, price_cents, category, condition
                 FROM products WHERE id = $1",
            )
            .bind(conversation.product_id)
            .fetch_one(pool)
            .await?;

            let sender = Self::profile(pool, conversation.sender_id).await?;
            let receiver = Self::profile(pool, conversation.receiver_id).await?;

            let messages = MessageRepo::list_by_conversation(pool, conversation.id).await?;

            previews.push(ConversationPreview {
                id: conversation.id,
                product_id: conversation.product_id,
                sender_id: conversation.sender_id,
                receiver_id: conversation.receiver_id,
                created_at: conversation.created_at,
                product,
                sender,
                receiver,
                messages,
            });
        }

        previews.sort_by_key(|p| {
            std::cmp::Reverse(last_activity(&p.messages).unwrap_or(p.created_at))
        });
        Ok(previews)
    }

    async fn profile(pool: &PgPool, user_id: DbId) -> Result<PublicProfile, sqlx::Error> {
        sqlx::query_as::<_, PublicProfile>("SELECT id, name, avatar_url FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }
}

/// Timestamp of the newest message, if any.
fn last_activity(messages: &[Message]) -> Option<tradepost_core::types::Timestamp> {
    messages.last().map(|m| m.created_at)
}
