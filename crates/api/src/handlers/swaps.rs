//! Handlers for swap requests.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use slotswap_core::error::CoreError;
use slotswap_core::swap::{SwapListing, SwapResolution};
use slotswap_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /swap-requests`.
#[derive(Debug, Deserialize)]
pub struct CreateSwapRequest {
    #[serde(alias = "mySlotId")]
    pub my_slot_id: Option<DbId>,
    #[serde(alias = "theirSlotId")]
    pub their_slot_id: Option<DbId>,
}

/// Request body for `POST /swap-requests/{id}/response`.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub accept: Option<bool>,
}

/// POST /api/v1/swap-requests
///
/// Propose exchanging one of the caller's slots for another user's slot.
/// Both slots are locked in SWAP_PENDING. Returns 201.
pub async fn propose_swap(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSwapRequest>,
) -> AppResult<impl IntoResponse> {
    let (Some(my_slot_id), Some(their_slot_id)) = (input.my_slot_id, input.their_slot_id) else {
        return Err(CoreError::Validation("my_slot_id and their_slot_id are required".into()).into());
    };

    let swap = state
        .negotiator
        .propose(auth.user_id, my_slot_id, their_slot_id)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: swap })))
}

/// GET /api/v1/swap-requests
///
/// The caller's incoming and outgoing requests, newest first.
pub async fn list_swaps(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SwapListing>>> {
    let listing = state.negotiator.list_for(auth.user_id).await?;
    Ok(Json(DataResponse { data: listing }))
}

/// POST /api/v1/swap-requests/{id}/response
///
/// Accept or reject a pending request targeted at the caller.
pub async fn respond_to_swap(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
    Json(input): Json<RespondRequest>,
) -> AppResult<Json<DataResponse<SwapResolution>>> {
    let accept = input
        .accept
        .ok_or_else(|| CoreError::Validation("accept must be true or false".into()))?;

    let resolution = state
        .negotiator
        .respond(auth.user_id, request_id, accept)
        .await?;
    Ok(Json(DataResponse { data: resolution }))
}
