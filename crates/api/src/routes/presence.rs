//! Route definition for presence heartbeats.

use axum::routing::post;
use axum::Router;

use crate::handlers::presence;
use crate::state::AppState;

/// Routes mounted at `/presence`.
///
/// ```text
/// POST   /   -> heartbeat
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(presence::heartbeat))
}
