//! Conversation-scoped publish/subscribe fan-out.
//!
//! This crate is the broker seam of the chat subsystem:
//!
//! - [`ChatEvent`] -- the wire envelope delivered on a conversation's
//!   channel (`new-message` with the full persisted record, or
//!   `online-presence` heartbeats).
//! - [`ChannelBus`] -- in-process hub of per-conversation
//!   `tokio::sync::broadcast` channels. Delivery is fire-and-forget and
//!   order-preserving per channel; durability stays with the message
//!   store.

pub mod bus;
pub mod event;

pub use bus::ChannelBus;
pub use event::ChatEvent;
