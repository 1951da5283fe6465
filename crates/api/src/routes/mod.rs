pub mod auth;
pub mod health;
pub mod slots;
pub mod swaps;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws?token=<jwt>                    WebSocket notification channel
///
/// /auth/signup                       register (public)
/// /auth/login                        login (public)
///
/// /slots                             list own, create
/// /slots/{id}                        set status, delete
/// /swappable-slots                   marketplace listing
///
/// /swap-requests                     propose, list incoming/outgoing
/// /swap-requests/{id}/response       accept or reject
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .merge(slots::router())
        .nest("/swap-requests", swaps::router())
}
