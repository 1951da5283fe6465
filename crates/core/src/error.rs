use crate::store::StoreError;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity is absent, or exists but is not owned/targeted by the caller.
    /// Callers cannot tell the two cases apart.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// An accept was attempted after one of the referenced slots vanished.
    /// The swap request has already been removed when this is returned.
    #[error("Swap request {swap_id} is stale: one of the slots no longer exists. Request canceled.")]
    StaleSwap { swap_id: DbId },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl CoreError {
    pub fn slot_not_found(id: DbId) -> Self {
        CoreError::NotFound { entity: "Slot", id }
    }

    pub fn swap_not_found(id: DbId) -> Self {
        CoreError::NotFound {
            entity: "SwapRequest",
            id,
        }
    }
}
