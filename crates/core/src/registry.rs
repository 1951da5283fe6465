//! Slot Registry: slot records and owner-driven status changes.
//!
//! The registry never moves a slot out of `SWAP_PENDING` on its own. A
//! status request against a locked slot is a cancellation and goes through
//! [`negotiator::teardown_pending`] inside the same transaction, after both
//! slots of the pending swap are locked.

use std::sync::Arc;

use crate::error::CoreError;
use crate::negotiator;
use crate::slot::{classify_status_change, CreateSlot, Slot, SlotStatus, StatusChange};
use crate::store::{SlotStore, StoreTx, SwappableSlot};
use crate::types::DbId;

/// Owns slot lifecycle operations. Cheap to clone.
#[derive(Clone)]
pub struct SlotRegistry {
    store: Arc<dyn SlotStore>,
}

impl SlotRegistry {
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self { store }
    }

    /// Create a slot for `owner`. New slots are BUSY unless the input asks
    /// for SWAPPABLE.
    pub async fn create_slot(&self, owner: DbId, input: CreateSlot) -> Result<Slot, CoreError> {
        let new = input.validate(owner)?;

        let mut tx = self.store.begin().await?;
        let slot = tx.insert_slot(&new).await?;
        tx.commit().await?;

        tracing::info!(
            slot_id = slot.id,
            user_id = owner,
            status = %slot.status,
            "Slot created"
        );
        Ok(slot)
    }

    /// Apply an owner's status request.
    ///
    /// Requesting the current status is a no-op. Leaving `SWAP_PENDING`
    /// tears down the pending swap first: the paired slot returns to
    /// SWAPPABLE and the swap request is deleted.
    pub async fn set_status(
        &self,
        slot_id: DbId,
        owner: DbId,
        new_status: SlotStatus,
    ) -> Result<Slot, CoreError> {
        let mut tx = self.store.begin().await?;

        // A pending slot and its partner are locked together, in the same
        // order as a response to their swap would lock them.
        let partner = tx
            .pending_swap_for_slot(slot_id)
            .await?
            .and_then(|swap| swap.counterpart_slot(slot_id));
        let mut slot = match partner {
            Some(partner_id) => {
                let (slot, _) = negotiator::lock_pair(&mut *tx, slot_id, partner_id).await?;
                slot.filter(|s| s.owner_id == owner)
                    .ok_or_else(|| CoreError::slot_not_found(slot_id))?
            }
            None => owned_slot(&mut *tx, slot_id, owner).await?,
        };

        match classify_status_change(slot.status, new_status)? {
            StatusChange::Unchanged => return Ok(slot),
            StatusChange::Toggle => {}
            StatusChange::Cancellation => {
                match negotiator::teardown_pending(&mut *tx, slot.id).await? {
                    Some(swap) => tracing::info!(
                        slot_id,
                        swap_id = swap.id,
                        user_id = owner,
                        "Pending swap cancelled by slot owner"
                    ),
                    None => tracing::warn!(
                        slot_id,
                        "SWAP_PENDING slot had no pending swap request; releasing it"
                    ),
                }
            }
        }

        let previous = slot.status;
        slot.status = new_status;
        tx.save_slot(&slot).await?;
        tx.commit().await?;

        tracing::info!(
            slot_id,
            user_id = owner,
            from = %previous,
            to = %new_status,
            "Slot status changed"
        );
        Ok(slot)
    }

    /// Delete a slot and purge every swap request that references it.
    ///
    /// Fails with a conflict while the slot is SWAP_PENDING.
    pub async fn delete_slot(&self, slot_id: DbId, owner: DbId) -> Result<(), CoreError> {
        let mut tx = self.store.begin().await?;
        let slot = owned_slot(&mut *tx, slot_id, owner).await?;

        if slot.status.is_locked() {
            return Err(CoreError::Conflict(
                "Cannot delete a slot with a pending swap. Cancel or reject the swap first."
                    .into(),
            ));
        }

        let purged = tx.delete_swaps_for_slot(slot.id).await?;
        tx.delete_slot(slot.id).await?;
        tx.commit().await?;

        tracing::info!(slot_id, user_id = owner, purged, "Slot deleted");
        Ok(())
    }

    /// Slots owned by `owner`, earliest start first.
    pub async fn list_owned(&self, owner: DbId) -> Result<Vec<Slot>, CoreError> {
        Ok(self.store.list_slots_by_owner(owner).await?)
    }

    /// SWAPPABLE slots of every user except `exclude_owner`, with owner info.
    pub async fn list_swappable(&self, exclude_owner: DbId) -> Result<Vec<SwappableSlot>, CoreError> {
        Ok(self.store.list_swappable_slots(exclude_owner).await?)
    }
}

/// Lock `slot_id` if it exists and belongs to `owner`.
///
/// A slot owned by someone else is reported as not found.
pub(crate) async fn owned_slot(
    tx: &mut dyn StoreTx,
    slot_id: DbId,
    owner: DbId,
) -> Result<Slot, CoreError> {
    tx.slot_for_update(slot_id)
        .await?
        .filter(|s| s.owner_id == owner)
        .ok_or_else(|| CoreError::slot_not_found(slot_id))
}
