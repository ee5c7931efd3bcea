//! WebSocket upgrade handler for a conversation's live-event stream.

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tradepost_core::channels::conversation_channel;
use tradepost_core::error::CoreError;
use tradepost_core::types::DbId;
use tradepost_db::repositories::ConversationRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Interval between keepalive Ping frames (in seconds).
const PING_INTERVAL_SECS: u64 = 30;

/// GET /api/v1/ws/conversations/{id}
///
/// Upgrade to WebSocket and forward every event published on
/// `conversation-{id}`, in publish order, as JSON text frames. Unknown
/// conversations are rejected before the upgrade.
pub async fn conversation_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
) -> AppResult<Response> {
    ConversationRepo::find_by_id(&state.pool, conversation_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Conversation",
            id: conversation_id,
        }))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, conversation_id)))
}

/// Pump bus events into the socket until either side goes away.
///
/// The subscription is taken before the first frame is written, so the
/// stream a client sees is a suffix of the channel's publish order. A
/// lagged receiver keeps going: the durable history endpoint is the
/// catch-up path, not the channel buffer.
async fn handle_socket(socket: WebSocket, state: AppState, conversation_id: DbId) {
    let channel = conversation_channel(conversation_id);
    let mut events = state.bus.subscribe(&channel);
    tracing::info!(conversation_id, "Live session subscribed");

    let (mut sink, mut stream) = socket.split();
    let mut ping = tokio::time::interval(std::time::Duration::from_secs(PING_INTERVAL_SECS));
    ping.tick().await; // First tick completes immediately.

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to encode chat event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(conversation_id, skipped, "Live session lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Pong(_))) => {
                    tracing::trace!(conversation_id, "Pong received");
                }
                Some(Ok(_)) => {
                    // Clients publish through the REST endpoints; inbound
                    // frames other than control traffic are ignored.
                }
                Some(Err(e)) => {
                    tracing::debug!(conversation_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            _ = ping.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!(conversation_id, "Live session closed");
}
