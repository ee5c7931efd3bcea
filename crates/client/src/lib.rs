//! Live-session client for the tradepost conversation subsystem.
//!
//! A [`ChatSession`] owns one open conversation view at a time: it
//! fetches the durable history, subscribes to the conversation's live
//! event channel, reconciles the two into a single deduplicated message
//! list, and runs the heartbeat/liveness timers that drive the
//! counterpart's online indicator. The transport behind it is a trait
//! seam ([`ChatTransport`]) with an HTTP + WebSocket production
//! implementation ([`HttpTransport`]).

pub mod cache;
pub mod error;
pub mod http;
pub mod presence;
pub mod session;
pub mod transport;

pub use cache::Expiring;
pub use error::ClientError;
pub use http::HttpTransport;
pub use presence::PresenceTracker;
pub use session::{ChatSession, SessionState};
pub use transport::{ChatTransport, EventStream};
