//! Swap Negotiator: the swap request lifecycle and the slot transitions it
//! drives.
//!
//! ```text
//! propose:  SWAPPABLE x2 -> SWAP_PENDING x2, request PENDING
//! reject:   SWAP_PENDING x2 -> SWAPPABLE x2, request REJECTED
//! accept:   SWAP_PENDING x2 -> BUSY x2 with owners exchanged, request ACCEPTED
//! stale:    surviving slot -> SWAPPABLE, request deleted
//! cancel:   paired slot -> SWAPPABLE, request deleted, own slot -> requested
//! ```
//!
//! Each operation reads, decides, and writes inside a single store
//! transaction, so two proposals racing for the same slot cannot both lock
//! it. Locks are taken in one global order: slots in ascending id order,
//! then the swap request row. Notifications go out after commit and their
//! failure is only logged.

use std::sync::Arc;

use chrono::Utc;

use crate::error::CoreError;
use crate::notify::{Notification, Notifier};
use crate::registry::SlotRegistry;
use crate::slot::{Slot, SlotStatus};
use crate::store::{SlotStore, StoreError, StoreTx};
use crate::swap::{check_proposal, SwapListing, SwapPolicy, SwapRequest, SwapResolution, SwapStatus};
use crate::types::DbId;

/// Owns swap request operations. Cheap to clone.
#[derive(Clone)]
pub struct Negotiator {
    store: Arc<dyn SlotStore>,
    registry: SlotRegistry,
    notifier: Arc<dyn Notifier>,
    policy: SwapPolicy,
}

impl Negotiator {
    pub fn new(store: Arc<dyn SlotStore>, notifier: Arc<dyn Notifier>, policy: SwapPolicy) -> Self {
        Self {
            registry: SlotRegistry::new(Arc::clone(&store)),
            store,
            notifier,
            policy,
        }
    }

    /// Propose exchanging `my_slot_id` (owned by `requester`) for
    /// `their_slot_id`. Locks both slots in SWAP_PENDING and notifies the
    /// target owner.
    pub async fn propose(
        &self,
        requester: DbId,
        my_slot_id: DbId,
        their_slot_id: DbId,
    ) -> Result<SwapRequest, CoreError> {
        if my_slot_id == their_slot_id {
            return Err(CoreError::Validation(
                "a slot cannot be swapped with itself".into(),
            ));
        }

        let mut tx = self.store.begin().await?;
        let (mine, theirs) = lock_pair(&mut *tx, my_slot_id, their_slot_id).await?;
        let mine = mine.ok_or_else(|| CoreError::slot_not_found(my_slot_id))?;
        let theirs = theirs.ok_or_else(|| CoreError::slot_not_found(their_slot_id))?;

        let new = check_proposal(self.policy, requester, &mine, &theirs)?;
        let swap = tx.insert_swap(&new).await?;
        for mut slot in [mine, theirs] {
            slot.status = SlotStatus::SwapPending;
            tx.save_slot(&slot).await?;
        }
        tx.commit().await?;

        tracing::info!(
            swap_id = swap.id,
            user_id = requester,
            requester_slot_id = my_slot_id,
            target_slot_id = their_slot_id,
            target_user_id = swap.target_user_id,
            "Swap proposed"
        );

        let requester_name = match self.store.find_user(requester).await {
            Ok(user) => user.map(|u| u.name),
            Err(e) => {
                tracing::warn!(user_id = requester, error = %e, "Could not load requester name");
                None
            }
        };
        self.dispatch(
            swap.target_user_id,
            Notification::new_request(requester_name.as_deref()),
        )
        .await;

        Ok(swap)
    }

    /// Accept or reject a PENDING request targeted at `responder`.
    ///
    /// Accepting after one of the slots vanished releases the surviving slot,
    /// deletes the request, and fails with [`CoreError::StaleSwap`].
    pub async fn respond(
        &self,
        responder: DbId,
        request_id: DbId,
        accept: bool,
    ) -> Result<SwapResolution, CoreError> {
        let answerable =
            |s: &SwapRequest| s.status == SwapStatus::Pending && s.target_user_id == responder;

        let mut tx = self.store.begin().await?;
        let unlocked = tx
            .find_swap(request_id)
            .await?
            .filter(answerable)
            .ok_or_else(|| CoreError::swap_not_found(request_id))?;

        let (requester_slot, target_slot) =
            lock_pair(&mut *tx, unlocked.requester_slot_id, unlocked.target_slot_id).await?;

        // A cancellation may have won the slot locks and deleted the request.
        let mut swap = tx
            .swap_for_update(request_id)
            .await?
            .filter(answerable)
            .ok_or_else(|| CoreError::swap_not_found(request_id))?;

        if accept {
            match (requester_slot, target_slot) {
                (Some(mut a), Some(mut b)) => {
                    std::mem::swap(&mut a.owner_id, &mut b.owner_id);
                    a.status = SlotStatus::Busy;
                    b.status = SlotStatus::Busy;
                    tx.save_slot(&a).await?;
                    tx.save_slot(&b).await?;
                    swap.status = SwapStatus::Accepted;
                }
                (a, b) => {
                    for slot in [a, b].into_iter().flatten() {
                        release(&mut *tx, slot).await?;
                    }
                    tx.delete_swap(swap.id).await?;
                    tx.commit().await?;

                    tracing::warn!(
                        swap_id = swap.id,
                        user_id = responder,
                        "Swap accept found a deleted slot; request removed"
                    );
                    return Err(CoreError::StaleSwap { swap_id: swap.id });
                }
            }
        } else {
            for slot in [requester_slot, target_slot].into_iter().flatten() {
                release(&mut *tx, slot).await?;
            }
            swap.status = SwapStatus::Rejected;
        }

        swap.updated_at = Utc::now();
        tx.save_swap(&swap).await?;
        tx.commit().await?;

        tracing::info!(
            swap_id = swap.id,
            user_id = responder,
            status = %swap.status,
            "Swap resolved"
        );

        self.dispatch(swap.requester_id, Notification::request_response(swap.status))
            .await;

        let message = if accept { "Swap accepted" } else { "Swap rejected" };
        Ok(SwapResolution {
            message: message.to_string(),
            swap,
        })
    }

    /// Cancel the pending swap holding `slot_id` and set the slot to
    /// `desired` (BUSY or SWAPPABLE). Routed through the registry so the
    /// same transition rules apply as for any owner status change.
    pub async fn cancel(
        &self,
        owner: DbId,
        slot_id: DbId,
        desired: SlotStatus,
    ) -> Result<Slot, CoreError> {
        self.registry.set_status(slot_id, owner, desired).await
    }

    /// Incoming and outgoing requests for `user`, newest first.
    pub async fn list_for(&self, user: DbId) -> Result<SwapListing, CoreError> {
        Ok(self.store.list_swaps_for_user(user).await?)
    }

    /// Revert SWAP_PENDING slots that no PENDING request references.
    ///
    /// Returns the ids of the slots that were released.
    pub async fn reconcile(&self) -> Result<Vec<DbId>, CoreError> {
        let mut tx = self.store.begin().await?;
        let orphans = tx.orphaned_pending_slots().await?;
        if orphans.is_empty() {
            return Ok(Vec::new());
        }

        let mut released = Vec::with_capacity(orphans.len());
        for slot in orphans {
            released.push(slot.id);
            release(&mut *tx, slot).await?;
        }
        tx.commit().await?;

        tracing::warn!(count = released.len(), slot_ids = ?released, "Released orphaned SWAP_PENDING slots");
        Ok(released)
    }

    async fn dispatch(&self, user_id: DbId, notification: Notification) {
        if let Err(e) = self.notifier.notify(user_id, &notification).await {
            tracing::warn!(
                user_id,
                event = %notification.event,
                error = %e,
                "Notification delivery failed"
            );
        }
    }
}

/// Tear down the PENDING request holding `slot_id`: the paired slot goes
/// back to SWAPPABLE and the request is deleted. The caller decides the
/// status of `slot_id` itself.
///
/// `slot_id` must already be locked, ideally together with its partner via
/// [`lock_pair`]. The request row is locked last.
///
/// Returns `None` when the slot is SWAP_PENDING without a backing request.
pub async fn teardown_pending(
    tx: &mut dyn StoreTx,
    slot_id: DbId,
) -> Result<Option<SwapRequest>, CoreError> {
    let Some(pending) = tx.pending_swap_for_slot(slot_id).await? else {
        return Ok(None);
    };

    let other = match pending.counterpart_slot(slot_id) {
        Some(other_id) => tx.slot_for_update(other_id).await?,
        None => None,
    };
    let Some(swap) = tx
        .swap_for_update(pending.id)
        .await?
        .filter(|s| s.status == SwapStatus::Pending)
    else {
        return Ok(None);
    };

    if let Some(other) = other {
        release(tx, other).await?;
    }
    tx.delete_swap(swap.id).await?;
    Ok(Some(swap))
}

/// Lock two slots in ascending id order, returning them in argument order.
pub(crate) async fn lock_pair(
    tx: &mut dyn StoreTx,
    first: DbId,
    second: DbId,
) -> Result<(Option<Slot>, Option<Slot>), StoreError> {
    if first <= second {
        let a = tx.slot_for_update(first).await?;
        let b = tx.slot_for_update(second).await?;
        Ok((a, b))
    } else {
        let b = tx.slot_for_update(second).await?;
        let a = tx.slot_for_update(first).await?;
        Ok((a, b))
    }
}

async fn release(tx: &mut dyn StoreTx, mut slot: Slot) -> Result<(), StoreError> {
    slot.status = SlotStatus::Swappable;
    tx.save_slot(&slot).await
}
