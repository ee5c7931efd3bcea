//! Handlers for the `/conversations` resource.
//!
//! All endpoints require authentication via [`AuthUser`].

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tradepost_core::conversation::Participants;
use tradepost_core::error::CoreError;
use tradepost_db::models::conversation::{Conversation, ConversationPreview, OpenConversation};
use tradepost_db::repositories::{ConversationRepo, ProductRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/conversations
///
/// Every conversation the caller participates in, joined with product
/// summary, participant profiles, and message history for previews.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ConversationPreview>>>> {
    let previews = ConversationRepo::list_previews_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: previews }))
}

/// POST /api/v1/conversations
///
/// Resolve the caller's conversation about a product, creating it on
/// first contact. Idempotent: repeated opens return the same row.
///
/// The product's current owner is authoritative for the receiving side;
/// the body's `receiverId` is cross-checked against it so a stale client
/// cannot attach a thread to the wrong seller.
pub async fn open(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<OpenConversation>,
) -> AppResult<(StatusCode, Json<Conversation>)> {
    let product_id = input
        .product_id
        .ok_or_else(|| AppError::Core(CoreError::Validation("productId is required".into())))?;
    let receiver_id = input
        .receiver_id
        .ok_or_else(|| AppError::Core(CoreError::Validation("receiverId is required".into())))?;

    let product = ProductRepo::find_by_id(&state.pool, product_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id: product_id,
        }))?;

    if receiver_id != product.owner_id {
        return Err(AppError::Core(CoreError::Validation(
            "receiverId does not match the listing owner".into(),
        )));
    }

    let participants = Participants::validate(auth.user_id, product.owner_id)
        .map_err(AppError::Core)?;

    let conversation = ConversationRepo::find_or_create(
        &state.pool,
        product.id,
        participants.sender_id,
        participants.receiver_id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(conversation)))
}
