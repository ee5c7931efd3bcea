//! The transport seam between a live session and the server.
//!
//! [`ChatSession`](crate::session::ChatSession) is written against this
//! trait so the reconciliation and presence logic can be exercised with
//! an in-memory double; [`HttpTransport`](crate::http::HttpTransport) is
//! the production implementation.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use tradepost_core::types::DbId;
use tradepost_db::models::message::Message;
use tradepost_events::ChatEvent;

use crate::error::ClientError;

/// A live event stream scoped to one conversation channel.
pub type EventStream = Pin<Box<dyn Stream<Item = ChatEvent> + Send>>;

/// Everything a live session needs from the outside world.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Full ordered message history of a conversation.
    async fn fetch_history(&self, conversation_id: DbId) -> Result<Vec<Message>, ClientError>;

    /// Append a message; the returned record is the persisted row.
    async fn send_message(
        &self,
        conversation_id: DbId,
        content: &str,
    ) -> Result<Message, ClientError>;

    /// Emit a presence heartbeat for `(conversation, user)`.
    async fn send_presence(&self, conversation_id: DbId, user_id: DbId)
        -> Result<(), ClientError>;

    /// Subscribe to the conversation's live event channel.
    ///
    /// Events arrive in publish order; the stream ends when the channel
    /// goes away.
    async fn subscribe(&self, conversation_id: DbId) -> Result<EventStream, ClientError>;
}
