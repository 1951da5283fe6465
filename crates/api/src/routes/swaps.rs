//! Route definitions for the `/swap-requests` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::swaps;
use crate::state::AppState;

/// Routes mounted at `/swap-requests`.
///
/// ```text
/// GET  /                 -> list_swaps
/// POST /                 -> propose_swap
/// POST /{id}/response    -> respond_to_swap
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(swaps::list_swaps).post(swaps::propose_swap))
        .route("/{id}/response", post(swaps::respond_to_swap))
}
