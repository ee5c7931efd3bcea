//! Conversation entity model and the aggregated preview shape.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tradepost_core::conversation::Participants;
use tradepost_core::types::{DbId, Timestamp};

use crate::models::message::Message;
use crate::models::product::ProductSummary;
use crate::models::user::PublicProfile;

/// A row from the `conversations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: DbId,
    pub product_id: DbId,
    pub sender_id: DbId,
    pub receiver_id: DbId,
    pub created_at: Timestamp,
}

impl Conversation {
    /// The participant pair of this conversation.
    pub fn participants(&self) -> Participants {
        Participants {
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
        }
    }
}

/// A conversation joined with everything the thread list needs: product
/// summary, both participants' public profiles, and the message history
/// for last-message previews.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPreview {
    pub id: DbId,
    pub product_id: DbId,
    pub sender_id: DbId,
    pub receiver_id: DbId,
    pub created_at: Timestamp,
    pub product: ProductSummary,
    pub sender: PublicProfile,
    pub receiver: PublicProfile,
    pub messages: Vec<Message>,
}

/// DTO for the open-conversation request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversation {
    pub product_id: Option<DbId>,
    pub receiver_id: Option<DbId>,
}
