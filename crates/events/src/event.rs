//! The live-event wire envelope.

use serde::{Deserialize, Serialize};
use tradepost_core::types::DbId;
use tradepost_db::models::message::Message;

/// An event delivered on a conversation channel.
///
/// Serialized as `{ "event": "<name>", "data": ... }` where the name
/// matches the constants in `tradepost_core::channels` and `data` is the
/// event payload:
///
/// - `new-message`: the full persisted [`Message`] record, so subscribers
///   need no follow-up fetch.
/// - `online-presence`: `{ "id": <userId> }`, an ephemeral heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ChatEvent {
    NewMessage(Message),
    OnlinePresence { id: DbId },
}

impl ChatEvent {
    /// The user id attributed to this event's sender, if any.
    pub fn origin_user(&self) -> Option<DbId> {
        match self {
            ChatEvent::NewMessage(message) => Some(message.sender_id),
            ChatEvent::OnlinePresence { id } => Some(*id),
        }
    }
}
