//! Route definitions for slots and the marketplace.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::slots;
use crate::state::AppState;

/// Slot routes, merged at the `/api/v1` root.
///
/// ```text
/// GET    /slots              -> list_slots
/// POST   /slots              -> create_slot
/// PUT    /slots/{id}         -> update_slot_status
/// DELETE /slots/{id}         -> delete_slot
/// GET    /swappable-slots    -> list_swappable
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slots", get(slots::list_slots).post(slots::create_slot))
        .route(
            "/slots/{id}",
            put(slots::update_slot_status).delete(slots::delete_slot),
        )
        .route("/swappable-slots", get(slots::list_swappable))
}
