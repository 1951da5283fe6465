//! In-process [`SlotStore`] backed by ordered maps.
//!
//! A transaction takes the store-wide lock for its whole lifetime and works
//! on a private copy of the state; `commit` swaps the copy in. Transactions
//! are therefore fully serialised, and a dropped transaction leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{SlotStore, StoreError, StoreTx, SwappableSlot};
use crate::slot::{NewSlot, Slot, SlotStatus};
use crate::swap::{NewSwapRequest, SlotBrief, SwapListing, SwapRequest, SwapStatus, SwapSummary};
use crate::types::DbId;
use crate::user::{NewUser, User};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<DbId, User>,
    slots: BTreeMap<DbId, Slot>,
    swaps: BTreeMap<DbId, SwapRequest>,
    last_user_id: DbId,
    last_slot_id: DbId,
    last_swap_id: DbId,
}

impl MemoryState {
    fn brief(&self, slot_id: DbId) -> Option<SlotBrief> {
        self.slots.get(&slot_id).map(|s| SlotBrief {
            id: s.id,
            title: s.title.clone(),
            start_time: s.start_time,
        })
    }

    fn summarize(&self, swap: &SwapRequest, counterpart: DbId) -> SwapSummary {
        SwapSummary {
            swap: swap.clone(),
            counterpart_name: self.users.get(&counterpart).map(|u| u.name.clone()),
            requester_slot: self.brief(swap.requester_slot_id),
            target_slot: self.brief(swap.target_slot_id),
        }
    }

    fn has_pending_swap(&self, slot_id: DbId) -> bool {
        self.swaps
            .values()
            .any(|s| s.status == SwapStatus::Pending && s.references(slot_id))
    }
}

/// Shared in-memory store. Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, input: &NewUser) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(StoreError::Duplicate(format!(
                "email '{}' is already registered",
                input.email
            )));
        }
        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_slots_by_owner(&self, owner_id: DbId) -> Result<Vec<Slot>, StoreError> {
        let state = self.state.lock().await;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.start_time, s.id));
        Ok(slots)
    }

    async fn list_swappable_slots(
        &self,
        exclude_owner: DbId,
    ) -> Result<Vec<SwappableSlot>, StoreError> {
        let state = self.state.lock().await;
        let mut slots: Vec<SwappableSlot> = state
            .slots
            .values()
            .filter(|s| s.status == SlotStatus::Swappable && s.owner_id != exclude_owner)
            .filter_map(|s| {
                state.users.get(&s.owner_id).map(|owner| SwappableSlot {
                    slot: s.clone(),
                    owner_name: owner.name.clone(),
                    owner_email: owner.email.clone(),
                })
            })
            .collect();
        slots.sort_by_key(|s| (s.slot.start_time, s.slot.id));
        Ok(slots)
    }

    async fn list_swaps_for_user(&self, user_id: DbId) -> Result<SwapListing, StoreError> {
        let state = self.state.lock().await;
        let mut listing = SwapListing::default();

        // Newest first; ids break ties between requests created in the same instant.
        let mut swaps: Vec<&SwapRequest> = state.swaps.values().collect();
        swaps.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        for swap in swaps {
            if swap.target_user_id == user_id {
                listing
                    .incoming
                    .push(state.summarize(swap, swap.requester_id));
            }
            if swap.requester_id == user_id {
                listing
                    .outgoing
                    .push(state.summarize(swap, swap.target_user_id));
            }
        }
        Ok(listing)
    }
}

/// Transaction over a private copy of the store state.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_slot(&mut self, input: &NewSlot) -> Result<Slot, StoreError> {
        self.working.last_slot_id += 1;
        let slot = Slot {
            id: self.working.last_slot_id,
            owner_id: input.owner_id,
            title: input.title.clone(),
            start_time: input.start_time,
            end_time: input.end_time,
            status: input.status,
            created_at: Utc::now(),
        };
        self.working.slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    async fn slot_for_update(&mut self, id: DbId) -> Result<Option<Slot>, StoreError> {
        Ok(self.working.slots.get(&id).cloned())
    }

    async fn save_slot(&mut self, slot: &Slot) -> Result<(), StoreError> {
        match self.working.slots.get_mut(&slot.id) {
            Some(existing) => {
                existing.owner_id = slot.owner_id;
                existing.status = slot.status;
                Ok(())
            }
            None => Err(StoreError::Backend(format!(
                "slot {} vanished inside its own transaction",
                slot.id
            ))),
        }
    }

    async fn delete_slot(&mut self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.working.slots.remove(&id).is_some())
    }

    async fn insert_swap(&mut self, input: &NewSwapRequest) -> Result<SwapRequest, StoreError> {
        self.working.last_swap_id += 1;
        let now = Utc::now();
        let swap = SwapRequest {
            id: self.working.last_swap_id,
            requester_id: input.requester_id,
            requester_slot_id: input.requester_slot_id,
            target_user_id: input.target_user_id,
            target_slot_id: input.target_slot_id,
            status: SwapStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.working.swaps.insert(swap.id, swap.clone());
        Ok(swap)
    }

    async fn find_swap(&mut self, id: DbId) -> Result<Option<SwapRequest>, StoreError> {
        Ok(self.working.swaps.get(&id).cloned())
    }

    async fn swap_for_update(&mut self, id: DbId) -> Result<Option<SwapRequest>, StoreError> {
        Ok(self.working.swaps.get(&id).cloned())
    }

    async fn pending_swap_for_slot(
        &mut self,
        slot_id: DbId,
    ) -> Result<Option<SwapRequest>, StoreError> {
        Ok(self
            .working
            .swaps
            .values()
            .find(|s| s.status == SwapStatus::Pending && s.references(slot_id))
            .cloned())
    }

    async fn save_swap(&mut self, swap: &SwapRequest) -> Result<(), StoreError> {
        match self.working.swaps.get_mut(&swap.id) {
            Some(existing) => {
                existing.status = swap.status;
                existing.updated_at = swap.updated_at;
                Ok(())
            }
            None => Err(StoreError::Backend(format!(
                "swap request {} vanished inside its own transaction",
                swap.id
            ))),
        }
    }

    async fn delete_swap(&mut self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.working.swaps.remove(&id).is_some())
    }

    async fn delete_swaps_for_slot(&mut self, slot_id: DbId) -> Result<u64, StoreError> {
        let before = self.working.swaps.len();
        self.working.swaps.retain(|_, s| !s.references(slot_id));
        Ok((before - self.working.swaps.len()) as u64)
    }

    async fn orphaned_pending_slots(&mut self) -> Result<Vec<Slot>, StoreError> {
        Ok(self
            .working
            .slots
            .values()
            .filter(|s| s.status == SlotStatus::SwapPending)
            .filter(|s| !self.working.has_pending_swap(s.id))
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
