pub mod conversation;
pub mod health;
pub mod presence;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /conversations                     list (GET), open (POST)
/// /conversations/{id}/messages       history (GET), send (POST)
/// /presence                          heartbeat (POST)
/// /ws/conversations/{id}             live-event WebSocket
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Conversation threads and their message logs.
        .nest("/conversations", conversation::router())
        // Ephemeral presence heartbeats.
        .nest("/presence", presence::router())
        // Live-event fan-out, one socket per open conversation view.
        .route("/ws/conversations/{id}", get(ws::conversation_ws_handler))
}
