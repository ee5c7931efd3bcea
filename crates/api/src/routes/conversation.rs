//! Route definitions for the `/conversations` resource.
//!
//! All endpoints require authentication.

use axum::routing::get;
use axum::Router;

use crate::handlers::{conversation, message};
use crate::state::AppState;

/// Routes mounted at `/conversations`.
///
/// ```text
/// GET    /                -> list
/// POST   /                -> open
/// GET    /{id}/messages   -> message history
/// POST   /{id}/messages   -> send message
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(conversation::list).post(conversation::open))
        .route("/{id}/messages", get(message::list).post(message::send))
}
