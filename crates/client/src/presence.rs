//! Counterpart presence derived from heartbeat signals.
//!
//! The tracker is the read side of the presence heuristic: it records
//! each signal attributed to the counterpart and answers "online?" as a
//! pure function of the last signal's age. Filtering out the client's
//! own heartbeat echo happens before recording, in the session event
//! loop.

use std::time::Duration;

use tradepost_core::presence::LIVENESS_TIMEOUT;
use tradepost_core::types::{DbId, Timestamp};

use crate::cache::Expiring;

/// Tracks the freshest presence signal per conversation counterpart.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    last_signal: Expiring<DbId>,
}

impl PresenceTracker {
    /// A tracker using the standard liveness window.
    pub fn new() -> Self {
        Self::with_timeout(LIVENESS_TIMEOUT)
    }

    /// A tracker with a custom liveness window (tests, tuning).
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            last_signal: Expiring::new(timeout),
        }
    }

    /// Record a counterpart signal observed at `now`.
    pub fn record_signal(&mut self, user_id: DbId, now: Timestamp) {
        self.last_signal.set(user_id, now);
    }

    /// Whether the counterpart's lease is still live at `now`.
    pub fn is_online(&self, now: Timestamp) -> bool {
        self.last_signal.get(now).is_some()
    }

    /// Forget everything (conversation switch / view close).
    pub fn reset(&mut self) {
        self.last_signal.clear();
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}
