//! Well-known pub/sub channel and event name constants.
//!
//! Channel names must match what live-session clients subscribe to and
//! what the message/presence handlers publish on. One channel per
//! conversation gives topic isolation: a subscriber never sees events for
//! a conversation it did not explicitly subscribe to.

use crate::types::DbId;

/// Event carrying a freshly persisted message (full record, so
/// subscribers need no follow-up fetch).
pub const EVENT_NEW_MESSAGE: &str = "new-message";

/// Ephemeral heartbeat event announcing that a user is viewing the
/// conversation.
pub const EVENT_ONLINE_PRESENCE: &str = "online-presence";

/// Build the broadcast channel name for a conversation.
pub fn conversation_channel(conversation_id: DbId) -> String {
    format!("conversation-{conversation_id}")
}
