//! Message entity model.
//!
//! Messages are append-only: a row is never mutated after insert, and the
//! total order within a conversation is `(created_at, id)`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tradepost_core::types::{DbId, Timestamp};

/// Delivery-status marker a message starts with.
pub const STATUS_SENT: &str = "sent";

/// A row from the `messages` table. This exact record is also the
/// `new-message` event payload, so subscribers need no follow-up fetch.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: DbId,
    pub conversation_id: DbId,
    pub sender_id: DbId,
    pub content: String,
    pub status: String,
    pub created_at: Timestamp,
}

/// DTO for the send-message request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub content: Option<String>,
}
