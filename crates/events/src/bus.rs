//! In-process per-conversation broadcast hub.
//!
//! [`ChannelBus`] keeps one `tokio::sync::broadcast` channel per
//! conversation, keyed by the channel name from
//! `tradepost_core::channels::conversation_channel`. It is designed to be
//! shared via `Arc<ChannelBus>` across the application.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::event::ChatEvent;

/// Buffer capacity for each conversation channel.
///
/// When the buffer is full, the oldest un-consumed events are dropped and
/// slow receivers observe `RecvError::Lagged`; they catch up from the
/// durable store on their next history fetch.
const CHANNEL_CAPACITY: usize = 256;

/// Per-conversation fan-out bus.
///
/// Publishing is fire-and-forget: a channel with no subscribers drops the
/// event silently (the message store remains the source of truth), and a
/// send error never propagates to the caller. Subscribing to a channel
/// only ever yields events published on that same channel, which is the
/// topic-isolation guarantee clients rely on.
pub struct ChannelBus {
    channels: Mutex<HashMap<String, broadcast::Sender<ChatEvent>>>,
}

impl ChannelBus {
    /// Create a new bus with no channels.
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Publish an event to every current subscriber of `channel`.
    ///
    /// An unknown channel or a channel whose subscribers are all gone is
    /// not an error; the entry is pruned so closed conversations do not
    /// accumulate senders.
    pub fn publish(&self, channel: &str, event: ChatEvent) {
        let mut channels = self.channels.lock().expect("channel map poisoned");
        if let Some(sender) = channels.get(channel) {
            if sender.send(event).is_err() {
                // Last receiver dropped; forget the channel.
                channels.remove(channel);
            }
        }
    }

    /// Subscribe to `channel`, creating it on first use.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<ChatEvent> {
        let mut channels = self.channels.lock().expect("channel map poisoned");
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Number of live channel entries (test and diagnostics hook).
    pub fn channel_count(&self) -> usize {
        self.channels.lock().expect("channel map poisoned").len()
    }
}

impl Default for ChannelBus {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
