//! Handlers for a conversation's message log.
//!
//! Both endpoints enforce participant membership: a caller who is
//! neither side of the thread gets 403, whatever they ask for.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tradepost_core::channels::conversation_channel;
use tradepost_core::conversation::role_of;
use tradepost_core::error::CoreError;
use tradepost_core::types::DbId;
use tradepost_db::models::conversation::Conversation;
use tradepost_db::models::message::{Message, SendMessage};
use tradepost_db::repositories::{ConversationRepo, MessageRepo};
use tradepost_events::ChatEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /conversations/{id}/messages`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Message id to continue after (keyset cursor). Omit for the start.
    pub after: Option<DbId>,
    /// Maximum number of results. Omit for the full history.
    pub limit: Option<i64>,
}

/// Maximum page size for history reads.
const MAX_LIMIT: i64 = 500;

/// GET /api/v1/conversations/{id}/messages
///
/// Ordered history of a conversation, ascending by `(createdAt, id)`.
/// With `after`/`limit`, a keyset page of that same ordering.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<Message>>>> {
    let conversation = require_participant(&state, conversation_id, auth.user_id).await?;

    let messages = match (params.after, params.limit) {
        (None, None) => MessageRepo::list_by_conversation(&state.pool, conversation.id).await?,
        (after, limit) => {
            let cursor = match after {
                Some(after_id) => Some(resolve_cursor(&state, conversation.id, after_id).await?),
                None => None,
            };
            let limit = limit.unwrap_or(MAX_LIMIT).clamp(1, MAX_LIMIT);
            MessageRepo::list_page(&state.pool, conversation.id, cursor, limit).await?
        }
    };

    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/conversations/{id}/messages
///
/// Append a message to the log, then publish it on the conversation's
/// channel. The append is authoritative: the broadcast is fire-and-forget
/// and never surfaces as a send failure (subscribers catch up on their
/// next history fetch).
pub async fn send(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
    Json(input): Json<SendMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let content = match input.content.as_deref() {
        Some(content) if !content.trim().is_empty() => content,
        _ => {
            return Err(AppError::Core(CoreError::Validation(
                "content is required".into(),
            )))
        }
    };

    let conversation = require_participant(&state, conversation_id, auth.user_id).await?;

    let message = MessageRepo::append(&state.pool, conversation.id, auth.user_id, content).await?;

    state.bus.publish(
        &conversation_channel(conversation.id),
        ChatEvent::NewMessage(message.clone()),
    );

    Ok((StatusCode::CREATED, Json(message)))
}

/// Load a conversation and verify the caller is one of its two
/// participants.
async fn require_participant(
    state: &AppState,
    conversation_id: DbId,
    user_id: DbId,
) -> AppResult<Conversation> {
    let conversation = ConversationRepo::find_by_id(&state.pool, conversation_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Conversation",
            id: conversation_id,
        }))?;

    if role_of(&conversation.participants(), user_id).is_none() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Caller is not a participant of this conversation".into(),
        )));
    }

    Ok(conversation)
}

/// Turn an `after` message id into the `(created_at, id)` keyset cursor.
///
/// The cursor message must belong to the conversation being paged.
async fn resolve_cursor(
    state: &AppState,
    conversation_id: DbId,
    after_id: DbId,
) -> AppResult<(tradepost_core::types::Timestamp, DbId)> {
    let cursor = MessageRepo::find_in_conversation(&state.pool, conversation_id, after_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "after does not name a message in this conversation".into(),
            ))
        })?;
    Ok((cursor.created_at, cursor.id))
}
