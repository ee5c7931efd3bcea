//! Presence lease evaluation.
//!
//! The pub/sub transport exposes no portable "client disconnected"
//! signal, so online state is approximated from application-level
//! heartbeats: a counterpart is considered online until its last signal
//! is older than a fixed liveness window. The evaluation is a pure
//! function of two timestamps so it can be tested without any transport
//! or timer in the loop.

use std::time::Duration;

use crate::types::Timestamp;

/// How often a client emits its own heartbeat while a conversation is
/// open.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// How often a client re-evaluates the counterpart's liveness.
pub const LIVENESS_CHECK_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum silence after which a presence signal is no longer trusted.
pub const LIVENESS_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether a lease granted at `last_seen` is still live at `now`.
///
/// A missing `last_seen` (no signal received yet) is never live. Clock
/// skew that puts `last_seen` in the future still counts as live; the
/// lease simply lasts until `last_seen + timeout` passes.
pub fn is_live(last_seen: Option<Timestamp>, now: Timestamp, timeout: Duration) -> bool {
    let Some(last_seen) = last_seen else {
        return false;
    };
    now.signed_duration_since(last_seen)
        <= chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX)
}
