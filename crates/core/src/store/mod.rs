//! Persistence abstraction for slots, swap requests, and users.
//!
//! [`SlotStore`] is shared across all request handlers as
//! `Arc<dyn SlotStore>`. Every read-decide-write sequence in the registry
//! and the negotiator runs inside one [`StoreTx`], which provides row-level
//! exclusivity for the records it has loaded `for_update` and all-or-nothing
//! application on [`StoreTx::commit`]. Dropping a transaction without
//! committing discards every change made through it.
//!
//! Implementations:
//! - [`memory::MemoryStore`] -- in-process, used by tests and local runs.
//! - `slotswap_db::PgSlotStore` -- PostgreSQL via `sqlx`.

pub mod memory;

use async_trait::async_trait;
use serde::Serialize;

use crate::slot::{NewSlot, Slot};
use crate::swap::{NewSwapRequest, SwapListing, SwapRequest};
use crate::types::DbId;
use crate::user::{NewUser, User};

pub use memory::MemoryStore;

/// Infrastructure failure of a store backend. Distinct from domain errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (e.g. duplicate email).
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    /// The backend is unreachable or failed to execute a statement.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// A swappable slot annotated with its owner for marketplace discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwappableSlot {
    #[serde(flatten)]
    pub slot: Slot,
    pub owner_name: String,
    pub owner_email: String,
}

/// Shared handle to the slot/swap/user collections.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Open a unit of work.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    /// Cheap connectivity check for health endpoints.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a user. Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn create_user(&self, input: &NewUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: DbId) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Slots owned by `owner_id`, ordered by start time ascending.
    async fn list_slots_by_owner(&self, owner_id: DbId) -> Result<Vec<Slot>, StoreError>;

    /// All SWAPPABLE slots whose owner is not `exclude_owner`, ordered by
    /// start time ascending.
    async fn list_swappable_slots(
        &self,
        exclude_owner: DbId,
    ) -> Result<Vec<SwappableSlot>, StoreError>;

    /// Swap requests where `user_id` is the target (incoming) or the
    /// requester (outgoing), newest first.
    async fn list_swaps_for_user(&self, user_id: DbId) -> Result<SwapListing, StoreError>;
}

/// One atomic unit of work against a [`SlotStore`].
#[async_trait]
pub trait StoreTx: Send {
    async fn insert_slot(&mut self, input: &NewSlot) -> Result<Slot, StoreError>;

    /// Load a slot and hold it exclusively until the transaction ends.
    async fn slot_for_update(&mut self, id: DbId) -> Result<Option<Slot>, StoreError>;

    /// Persist owner and status changes of a previously loaded slot.
    async fn save_slot(&mut self, slot: &Slot) -> Result<(), StoreError>;

    async fn delete_slot(&mut self, id: DbId) -> Result<bool, StoreError>;

    async fn insert_swap(&mut self, input: &NewSwapRequest) -> Result<SwapRequest, StoreError>;

    /// Read a swap request without locking it.
    async fn find_swap(&mut self, id: DbId) -> Result<Option<SwapRequest>, StoreError>;

    /// Load a swap request and hold it exclusively until the transaction ends.
    ///
    /// Slot rows are always locked before swap rows. Callers that need both
    /// read the request with [`StoreTx::find_swap`] or
    /// [`StoreTx::pending_swap_for_slot`] first, lock its slots, then lock it.
    async fn swap_for_update(&mut self, id: DbId) -> Result<Option<SwapRequest>, StoreError>;

    /// The PENDING swap request referencing `slot_id` on either side. Not locked.
    async fn pending_swap_for_slot(
        &mut self,
        slot_id: DbId,
    ) -> Result<Option<SwapRequest>, StoreError>;

    /// Persist status and `updated_at` changes of a previously loaded request.
    async fn save_swap(&mut self, swap: &SwapRequest) -> Result<(), StoreError>;

    async fn delete_swap(&mut self, id: DbId) -> Result<bool, StoreError>;

    /// Delete every swap request, in any status, referencing `slot_id`.
    async fn delete_swaps_for_slot(&mut self, slot_id: DbId) -> Result<u64, StoreError>;

    /// SWAP_PENDING slots with no PENDING swap request referencing them, locked.
    async fn orphaned_pending_slots(&mut self) -> Result<Vec<Slot>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
