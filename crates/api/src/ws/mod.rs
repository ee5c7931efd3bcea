//! WebSocket fan-out for live conversation events.
//!
//! Each accepted socket is bound to exactly one conversation channel on
//! the broadcast bus; there is no cross-conversation connection registry.

mod handler;

pub use handler::conversation_ws_handler;
