//! Handlers for the caller's own slots and the swappable-slot marketplace.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use slotswap_core::error::CoreError;
use slotswap_core::slot::{CreateSlot, Slot, SlotStatus};
use slotswap_core::store::SwappableSlot;
use slotswap_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /slots/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateSlotStatus {
    pub status: Option<String>,
}

/// GET /api/v1/slots
///
/// The caller's slots, earliest first.
pub async fn list_slots(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Slot>>>> {
    let slots = state.registry.list_owned(auth.user_id).await?;
    Ok(Json(DataResponse { data: slots }))
}

/// POST /api/v1/slots
///
/// Create a slot owned by the caller. Returns 201.
pub async fn create_slot(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSlot>,
) -> AppResult<impl IntoResponse> {
    let slot = state.registry.create_slot(auth.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: slot })))
}

/// PUT /api/v1/slots/{id}
///
/// Change the status of one of the caller's slots. Moving a SWAP_PENDING
/// slot cancels its pending swap and releases the paired slot.
pub async fn update_slot_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(slot_id): Path<DbId>,
    Json(input): Json<UpdateSlotStatus>,
) -> AppResult<Json<DataResponse<Slot>>> {
    let status: SlotStatus = input
        .status
        .ok_or_else(|| CoreError::Validation("status is required".into()))?
        .parse()?;

    let slot = state
        .registry
        .set_status(slot_id, auth.user_id, status)
        .await?;
    Ok(Json(DataResponse { data: slot }))
}

/// DELETE /api/v1/slots/{id}
///
/// Delete one of the caller's slots. Returns 204 No Content.
pub async fn delete_slot(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(slot_id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.registry.delete_slot(slot_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/swappable-slots
///
/// SWAPPABLE slots of other users, with owner name and email.
pub async fn list_swappable(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SwappableSlot>>>> {
    let slots = state.registry.list_swappable(auth.user_id).await?;
    Ok(Json(DataResponse { data: slots }))
}
