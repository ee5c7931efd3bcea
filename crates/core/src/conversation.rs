//! Participant-role inference and participant validation for
//! conversations.
//!
//! A conversation always joins exactly two users: the initiator (the user
//! who opened the thread about someone else's listing) and the owner (the
//! user whose listing it is). Display and permission decisions that depend
//! on "which side am I" go through [`role_of`] rather than ad hoc id
//! comparisons at call sites.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// The two participant ids of a conversation, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participants {
    /// The initiating user (`senderId` on the wire).
    pub sender_id: DbId,
    /// The listing owner at creation time (`receiverId` on the wire).
    pub receiver_id: DbId,
}

/// Which side of a conversation a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The user opened the conversation about another user's listing.
    Initiator,
    /// The user owns the listing the conversation is about.
    Owner,
}

impl Participants {
    /// Validate a prospective participant pair.
    ///
    /// A seller cannot open a conversation with themself.
    pub fn validate(sender_id: DbId, receiver_id: DbId) -> Result<Self, CoreError> {
        if sender_id == receiver_id {
            return Err(CoreError::Validation(
                "User cannot be both sender and receiver".into(),
            ));
        }
        Ok(Self {
            sender_id,
            receiver_id,
        })
    }

    /// The counterpart of `user_id`, if `user_id` is a participant.
    pub fn counterpart_of(&self, user_id: DbId) -> Option<DbId> {
        match role_of(self, user_id)? {
            Role::Initiator => Some(self.receiver_id),
            Role::Owner => Some(self.sender_id),
        }
    }
}

/// Resolve the role of `user_id` within a conversation.
///
/// Returns `None` when the user is not a participant at all; callers that
/// gate access on participation treat that as `Forbidden`.
pub fn role_of(participants: &Participants, user_id: DbId) -> Option<Role> {
    if user_id == participants.sender_id {
        Some(Role::Initiator)
    } else if user_id == participants.receiver_id {
        Some(Role::Owner)
    } else {
        None
    }
}
