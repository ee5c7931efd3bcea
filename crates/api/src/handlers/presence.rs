//! Handler for presence heartbeats.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tradepost_core::channels::conversation_channel;
use tradepost_core::error::CoreError;
use tradepost_core::types::DbId;
use tradepost_events::ChatEvent;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Body of a presence heartbeat.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceHeartbeat {
    pub conversation_id: Option<DbId>,
    pub user_id: Option<DbId>,
}

/// POST /api/v1/presence
///
/// Publish an `online-presence` event on the conversation's channel.
/// Nothing is persisted; the signal decays on the receiving side. The
/// request succeeds once the broker publish has been attempted; a
/// heartbeat that nobody hears is not an error.
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(input): Json<PresenceHeartbeat>,
) -> AppResult<Json<serde_json::Value>> {
    let conversation_id = input.conversation_id.ok_or_else(|| {
        AppError::Core(CoreError::Validation("conversationId is required".into()))
    })?;
    let user_id = input
        .user_id
        .ok_or_else(|| AppError::Core(CoreError::Validation("userId is required".into())))?;

    state.bus.publish(
        &conversation_channel(conversation_id),
        ChatEvent::OnlinePresence { id: user_id },
    );

    Ok(Json(serde_json::json!({
        "data": { "published": true }
    })))
}
