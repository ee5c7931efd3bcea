//! A single-value cache with a validity window.
//!
//! Any derived value whose information decays (a presence signal, a
//! geolocation fix) carries an explicit timestamp and is treated as
//! absent once it is older than a fixed TTL. Staleness is decided at
//! read time against a caller-supplied "now", so the wrapper stays a
//! pure data structure.

use std::time::Duration;

use tradepost_core::presence::is_live;
use tradepost_core::types::Timestamp;

/// A value that expires `ttl` after it was stamped.
#[derive(Debug, Clone)]
pub struct Expiring<T> {
    slot: Option<(T, Timestamp)>,
    ttl: Duration,
}

impl<T> Expiring<T> {
    /// An empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self { slot: None, ttl }
    }

    /// Store `value`, stamped at `now`.
    pub fn set(&mut self, value: T, now: Timestamp) {
        self.slot = Some((value, now));
    }

    /// The cached value, if one is present and still within its window.
    pub fn get(&self, now: Timestamp) -> Option<&T> {
        match &self.slot {
            Some((value, stamped_at)) if is_live(Some(*stamped_at), now, self.ttl) => Some(value),
            _ => None,
        }
    }

    /// When the current value was stamped, stale or not.
    pub fn stamped_at(&self) -> Option<Timestamp> {
        self.slot.as_ref().map(|(_, at)| *at)
    }

    /// Drop the value outright.
    pub fn clear(&mut self) {
        self.slot = None;
    }
}
