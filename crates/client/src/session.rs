//! The per-conversation live session state machine.
//!
//! One [`ChatSession`] mirrors one open conversation view. Opening a
//! conversation fetches the durable history, then subscribes to the live
//! channel, so the event stream is a suffix of the fetched ordering. The
//! fetch/subscribe race can still double-deliver a message, so the local
//! list is keyed by message id and duplicates are dropped before they
//! are ever observable.
//!
//! Three background tasks run while a conversation is open, all scoped
//! to an epoch that is bumped on every open/close:
//!
//! - the event pump, draining the channel subscription;
//! - heartbeat emission, announcing this client every few seconds;
//! - liveness evaluation, decaying the counterpart's online flag.
//!
//! A task that wakes up under a stale epoch exits without touching
//! state, which is what keeps a quick conversation switch from leaking
//! events, timers, or presence across views.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tradepost_core::presence::{HEARTBEAT_INTERVAL, LIVENESS_CHECK_INTERVAL};
use tradepost_core::types::{DbId, Timestamp};
use tradepost_db::models::message::Message;
use tradepost_events::ChatEvent;

use crate::error::ClientError;
use crate::presence::PresenceTracker;
use crate::transport::ChatTransport;

/// Lifecycle of a conversation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No conversation selected.
    Closed,
    /// History fetch in flight.
    Fetching,
    /// History loaded and the live subscription is active.
    Subscribed,
}

/// Reconciled local state of one conversation view.
struct SessionInner {
    state: SessionState,
    conversation_id: Option<DbId>,
    messages: Vec<Message>,
    seen: HashSet<DbId>,
    presence: PresenceTracker,
    counterpart_online: bool,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            state: SessionState::Closed,
            conversation_id: None,
            messages: Vec::new(),
            seen: HashSet::new(),
            presence: PresenceTracker::new(),
            counterpart_online: false,
        }
    }

    fn begin(&mut self, conversation_id: DbId) {
        self.reset();
        self.state = SessionState::Fetching;
        self.conversation_id = Some(conversation_id);
    }

    fn reset(&mut self) {
        self.state = SessionState::Closed;
        self.conversation_id = None;
        self.messages.clear();
        self.seen.clear();
        self.presence.reset();
        self.counterpart_online = false;
    }

    /// Install the fetched history as the list prefix and mark the
    /// subscription live.
    fn apply_history(&mut self, history: Vec<Message>) {
        for message in history {
            if self.seen.insert(message.id) {
                self.messages.push(message);
            }
        }
        self.state = SessionState::Subscribed;
    }

    /// Fold one live event into local state.
    ///
    /// Message delivery is at-least-once across the fetch/subscribe
    /// boundary; the `seen` set makes it exactly-once here. A presence
    /// echo carrying our own id never flips the counterpart flag.
    fn apply_event(&mut self, event: ChatEvent, self_user_id: DbId, now: Timestamp) {
        match event {
            ChatEvent::NewMessage(message) => {
                if self.seen.insert(message.id) {
                    self.messages.push(message);
                }
            }
            ChatEvent::OnlinePresence { id } if id != self_user_id => {
                self.presence.record_signal(id, now);
                self.counterpart_online = true;
            }
            ChatEvent::OnlinePresence { .. } => {
                // Our own heartbeat reflected back by the channel.
            }
        }
    }

    /// Re-derive the online flag from the last signal's age.
    fn evaluate_liveness(&mut self, now: Timestamp) {
        self.counterpart_online = self.presence.is_online(now);
    }
}

/// Shared between the session handle and its background tasks.
struct Shared {
    /// Bumped on every open/close; tasks holding an older value stop.
    epoch: AtomicU64,
    inner: Mutex<SessionInner>,
}

/// A client-side live session over one conversation at a time.
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    self_user_id: DbId,
    shared: Arc<Shared>,
    tasks: Vec<JoinHandle<()>>,
}

impl ChatSession {
    /// Create a session for the given principal over `transport`.
    pub fn new(transport: Arc<dyn ChatTransport>, self_user_id: DbId) -> Self {
        Self {
            transport,
            self_user_id,
            shared: Arc::new(Shared {
                epoch: AtomicU64::new(0),
                inner: Mutex::new(SessionInner::new()),
            }),
            tasks: Vec::new(),
        }
    }

    /// Open a conversation view: fetch history, subscribe, start timers.
    ///
    /// Any previously open conversation is closed first. If a newer open
    /// supersedes this one while its fetch is still in flight, the stale
    /// responses are discarded rather than applied to the wrong view.
    pub async fn open(&mut self, conversation_id: DbId) -> Result<(), ClientError> {
        self.close();
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        self.lock_inner().begin(conversation_id);

        let history = self.transport.fetch_history(conversation_id).await?;
        if self.shared.epoch.load(Ordering::SeqCst) != epoch {
            return Ok(());
        }

        let mut events = self.transport.subscribe(conversation_id).await?;
        if self.shared.epoch.load(Ordering::SeqCst) != epoch {
            return Ok(());
        }

        self.lock_inner().apply_history(history);

        // Event pump: drain the subscription into local state.
        let pump_shared = Arc::clone(&self.shared);
        let self_user_id = self.self_user_id;
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if pump_shared.epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }
                pump_shared
                    .inner
                    .lock()
                    .expect("session state poisoned")
                    .apply_event(event, self_user_id, Utc::now());
            }
        }));

        // Heartbeat emission: announce this client on a fixed cadence.
        let heartbeat_transport = Arc::clone(&self.transport);
        let heartbeat_shared = Arc::clone(&self.shared);
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
            loop {
                interval.tick().await;
                if heartbeat_shared.epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }
                if let Err(e) = heartbeat_transport
                    .send_presence(conversation_id, self_user_id)
                    .await
                {
                    // Best-effort signal: a lost heartbeat is invisible
                    // to the user and the next one is seconds away.
                    tracing::debug!(error = %e, conversation_id, "Heartbeat failed");
                }
            }
        }));

        // Liveness evaluation: decay the counterpart's online flag.
        let liveness_shared = Arc::clone(&self.shared);
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(LIVENESS_CHECK_INTERVAL);
            loop {
                interval.tick().await;
                if liveness_shared.epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }
                liveness_shared
                    .inner
                    .lock()
                    .expect("session state poisoned")
                    .evaluate_liveness(Utc::now());
            }
        }));

        Ok(())
    }

    /// Close the current view: cancel the subscription and both timers
    /// together, and clear local state.
    pub fn close(&mut self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.lock_inner().reset();
    }

    /// Send a message to the open conversation.
    ///
    /// The sent message is NOT inserted locally: rendering waits for the
    /// echoed `new-message` event, so the view only ever shows what the
    /// store actually persisted. On error the caller keeps the input for
    /// retry.
    pub async fn send(&self, content: &str) -> Result<Message, ClientError> {
        let conversation_id = self
            .lock_inner()
            .conversation_id
            .ok_or(ClientError::NotOpen)?;
        self.transport.send_message(conversation_id, content).await
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.lock_inner().state
    }

    /// The open conversation, if any.
    pub fn conversation_id(&self) -> Option<DbId> {
        self.lock_inner().conversation_id
    }

    /// Snapshot of the reconciled message list, in order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock_inner().messages.clone()
    }

    /// Whether the counterpart currently holds a live presence lease.
    pub fn is_counterpart_online(&self) -> bool {
        self.lock_inner().counterpart_online
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, SessionInner> {
        self.shared.inner.lock().expect("session state poisoned")
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::AtomicI64;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    use crate::transport::EventStream;

    fn msg(id: DbId, conversation_id: DbId, sender_id: DbId, content: &str) -> Message {
        Message {
            id,
            conversation_id,
            sender_id,
            content: content.to_string(),
            status: "sent".to_string(),
            created_at: Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap(),
        }
    }

    /// In-memory transport double. Histories are seeded per
    /// conversation; live events are pushed by the test through
    /// [`MockTransport::push_event`].
    struct MockTransport {
        histories: Mutex<HashMap<DbId, Vec<Message>>>,
        channels: Mutex<HashMap<DbId, mpsc::UnboundedSender<ChatEvent>>>,
        sent: Mutex<Vec<(DbId, String)>>,
        presence_pings: Mutex<Vec<(DbId, DbId)>>,
        next_id: AtomicI64,
    }

    impl MockTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                histories: Mutex::new(HashMap::new()),
                channels: Mutex::new(HashMap::new()),
                sent: Mutex::new(Vec::new()),
                presence_pings: Mutex::new(Vec::new()),
                next_id: AtomicI64::new(1000),
            })
        }

        fn seed_history(&self, conversation_id: DbId, history: Vec<Message>) {
            self.histories
                .lock()
                .unwrap()
                .insert(conversation_id, history);
        }

        fn push_event(&self, conversation_id: DbId, event: ChatEvent) {
            if let Some(tx) = self.channels.lock().unwrap().get(&conversation_id) {
                let _ = tx.send(event);
            }
        }

        fn ping_count(&self) -> usize {
            self.presence_pings.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatTransport for MockTransport {
        async fn fetch_history(
            &self,
            conversation_id: DbId,
        ) -> Result<Vec<Message>, ClientError> {
            Ok(self
                .histories
                .lock()
                .unwrap()
                .get(&conversation_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn send_message(
            &self,
            conversation_id: DbId,
            content: &str,
        ) -> Result<Message, ClientError> {
            self.sent
                .lock()
                .unwrap()
                .push((conversation_id, content.to_string()));
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(msg(id, conversation_id, 1, content))
        }

        async fn send_presence(
            &self,
            conversation_id: DbId,
            user_id: DbId,
        ) -> Result<(), ClientError> {
            self.presence_pings
                .lock()
                .unwrap()
                .push((conversation_id, user_id));
            Ok(())
        }

        async fn subscribe(&self, conversation_id: DbId) -> Result<EventStream, ClientError> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.channels.lock().unwrap().insert(conversation_id, tx);
            Ok(Box::pin(UnboundedReceiverStream::new(rx)))
        }
    }

    /// Poll `check` until it passes or a second of (test) time elapses.
    async fn wait_until(mut check: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("condition should hold within the timeout");
    }

    const SELF_ID: DbId = 1;
    const PEER_ID: DbId = 2;

    #[tokio::test]
    async fn open_loads_history_and_subscribes() {
        let transport = MockTransport::new();
        transport.seed_history(5, vec![msg(1, 5, PEER_ID, "hi"), msg(2, 5, SELF_ID, "hello")]);

        let mut session = ChatSession::new(transport, SELF_ID);
        assert_eq!(session.state(), SessionState::Closed);

        session.open(5).await.expect("open should succeed");

        assert_eq!(session.state(), SessionState::Subscribed);
        assert_eq!(session.conversation_id(), Some(5));
        let contents: Vec<String> =
            session.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, ["hi", "hello"]);
    }

    #[tokio::test]
    async fn live_events_extend_the_history_suffix() {
        let transport = MockTransport::new();
        transport.seed_history(5, vec![msg(1, 5, PEER_ID, "hi")]);

        let mut session = ChatSession::new(Arc::clone(&transport) as Arc<dyn ChatTransport>, SELF_ID);
        session.open(5).await.expect("open should succeed");

        transport.push_event(5, ChatEvent::NewMessage(msg(2, 5, PEER_ID, "still there?")));
        wait_until(|| session.messages().len() == 2).await;

        let contents: Vec<String> =
            session.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, ["hi", "still there?"]);
    }

    #[tokio::test]
    async fn duplicate_deliveries_are_dropped_by_id() {
        let transport = MockTransport::new();
        transport.seed_history(5, vec![msg(1, 5, PEER_ID, "hi")]);

        let mut session = ChatSession::new(Arc::clone(&transport) as Arc<dyn ChatTransport>, SELF_ID);
        session.open(5).await.expect("open should succeed");

        // The fetch/subscribe race re-delivers the last history message,
        // then a genuinely new one arrives.
        transport.push_event(5, ChatEvent::NewMessage(msg(1, 5, PEER_ID, "hi")));
        transport.push_event(5, ChatEvent::NewMessage(msg(2, 5, PEER_ID, "new")));
        wait_until(|| session.messages().len() == 2).await;

        let ids: Vec<DbId> = session.messages().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, [1, 2], "duplicate id 1 must appear exactly once");
    }

    #[tokio::test]
    async fn sent_messages_render_only_via_the_echo() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new(Arc::clone(&transport) as Arc<dyn ChatTransport>, SELF_ID);
        session.open(5).await.expect("open should succeed");

        let persisted = session.send("on my way").await.expect("send should succeed");
        assert!(
            session.messages().is_empty(),
            "no optimistic insert before the echo arrives"
        );

        transport.push_event(5, ChatEvent::NewMessage(persisted));
        wait_until(|| session.messages().len() == 1).await;
        assert_eq!(session.messages()[0].content, "on my way");
    }

    #[tokio::test]
    async fn send_without_an_open_conversation_fails() {
        let transport = MockTransport::new();
        let session = ChatSession::new(transport, SELF_ID);

        let result = session.send("hello?").await;
        assert!(matches!(result, Err(ClientError::NotOpen)));
    }

    #[tokio::test]
    async fn own_presence_echo_never_marks_the_counterpart_online() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new(Arc::clone(&transport) as Arc<dyn ChatTransport>, SELF_ID);
        session.open(5).await.expect("open should succeed");

        // The echo arrives first; the marker message proves the pump has
        // processed past it before we assert.
        transport.push_event(5, ChatEvent::OnlinePresence { id: SELF_ID });
        transport.push_event(5, ChatEvent::NewMessage(msg(1, 5, PEER_ID, "marker")));
        wait_until(|| session.messages().len() == 1).await;
        assert!(!session.is_counterpart_online());

        transport.push_event(5, ChatEvent::OnlinePresence { id: PEER_ID });
        wait_until(|| session.is_counterpart_online()).await;
    }

    #[tokio::test]
    async fn switching_conversations_ignores_the_old_channel() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new(Arc::clone(&transport) as Arc<dyn ChatTransport>, SELF_ID);

        session.open(5).await.expect("open should succeed");
        session.open(6).await.expect("open should succeed");
        assert_eq!(session.conversation_id(), Some(6));

        // An event straggling in on the old conversation's channel must
        // not leak into the new view.
        transport.push_event(5, ChatEvent::NewMessage(msg(9, 5, PEER_ID, "stale")));
        transport.push_event(6, ChatEvent::NewMessage(msg(10, 6, PEER_ID, "fresh")));
        wait_until(|| !session.messages().is_empty()).await;

        let contents: Vec<String> =
            session.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, ["fresh"]);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeats_are_emitted_while_open_and_stop_on_close() {
        let transport = MockTransport::new();
        let mut session = ChatSession::new(Arc::clone(&transport) as Arc<dyn ChatTransport>, SELF_ID);
        session.open(5).await.expect("open should succeed");

        // First tick fires immediately, then every interval.
        tokio::time::sleep(HEARTBEAT_INTERVAL * 2 + Duration::from_millis(100)).await;
        let while_open = transport.ping_count();
        assert!(
            while_open >= 2,
            "expected at least two heartbeats, got {while_open}"
        );
        assert_eq!(
            transport.presence_pings.lock().unwrap()[0],
            (5, SELF_ID),
            "heartbeat names the open conversation and this client"
        );

        session.close();
        assert_eq!(session.state(), SessionState::Closed);

        tokio::time::sleep(HEARTBEAT_INTERVAL * 4).await;
        assert_eq!(
            transport.ping_count(),
            while_open,
            "no heartbeat may fire after close"
        );
    }

    #[tokio::test]
    async fn close_clears_local_state() {
        let transport = MockTransport::new();
        transport.seed_history(5, vec![msg(1, 5, PEER_ID, "hi")]);

        let mut session = ChatSession::new(Arc::clone(&transport) as Arc<dyn ChatTransport>, SELF_ID);
        session.open(5).await.expect("open should succeed");
        transport.push_event(5, ChatEvent::OnlinePresence { id: PEER_ID });
        wait_until(|| session.is_counterpart_online()).await;

        session.close();

        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.conversation_id(), None);
        assert!(session.messages().is_empty());
        assert!(!session.is_counterpart_online());
    }
}
