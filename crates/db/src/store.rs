//! [`SlotStore`] over PostgreSQL.

use async_trait::async_trait;
use slotswap_core::slot::{NewSlot, Slot};
use slotswap_core::store::{SlotStore, StoreError, StoreTx, SwappableSlot};
use slotswap_core::swap::{NewSwapRequest, SwapListing, SwapRequest};
use slotswap_core::types::DbId;
use slotswap_core::user::{NewUser, User};
use sqlx::{Postgres, Transaction};

use crate::error::store_error;
use crate::models::slot::SlotRow;
use crate::repositories::swap_request_repo::Direction;
use crate::repositories::{SlotRepo, SwapRequestRepo, UserRepo};
use crate::DbPool;

/// PostgreSQL-backed store. Cheap to clone; shares the pool.
#[derive(Debug, Clone)]
pub struct PgSlotStore {
    pool: DbPool,
}

impl PgSlotStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_slots(rows: Vec<SlotRow>) -> Result<Vec<Slot>, StoreError> {
    rows.into_iter().map(SlotRow::into_slot).collect()
}

#[async_trait]
impl SlotStore for PgSlotStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin().await.map_err(store_error)?;
        Ok(Box::new(PgStoreTx { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(store_error)
    }

    async fn create_user(&self, input: &NewUser) -> Result<User, StoreError> {
        let row = UserRepo::create(&self.pool, input)
            .await
            .map_err(store_error)?;
        Ok(row.into())
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, StoreError> {
        let row = UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = UserRepo::find_by_email(&self.pool, email)
            .await
            .map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_slots_by_owner(&self, owner_id: DbId) -> Result<Vec<Slot>, StoreError> {
        let rows = SlotRepo::list_by_owner(&self.pool, owner_id)
            .await
            .map_err(store_error)?;
        into_slots(rows)
    }

    async fn list_swappable_slots(
        &self,
        exclude_owner: DbId,
    ) -> Result<Vec<SwappableSlot>, StoreError> {
        SlotRepo::list_swappable(&self.pool, exclude_owner)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|row| row.into_swappable())
            .collect()
    }

    async fn list_swaps_for_user(&self, user_id: DbId) -> Result<SwapListing, StoreError> {
        let mut listing = SwapListing::default();
        for (direction, bucket) in [
            (Direction::Incoming, &mut listing.incoming),
            (Direction::Outgoing, &mut listing.outgoing),
        ] {
            let rows = SwapRequestRepo::list_for_user(&self.pool, user_id, direction)
                .await
                .map_err(store_error)?;
            for row in rows {
                bucket.push(row.into_summary()?);
            }
        }
        Ok(listing)
    }
}

/// A unit of work on one pooled connection. Dropping it without
/// [`StoreTx::commit`] rolls back.
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn insert_slot(&mut self, input: &NewSlot) -> Result<Slot, StoreError> {
        SlotRepo::create(&mut *self.tx, input)
            .await
            .map_err(store_error)?
            .into_slot()
    }

    async fn slot_for_update(&mut self, id: DbId) -> Result<Option<Slot>, StoreError> {
        SlotRepo::find_for_update(&mut *self.tx, id)
            .await
            .map_err(store_error)?
            .map(SlotRow::into_slot)
            .transpose()
    }

    async fn save_slot(&mut self, slot: &Slot) -> Result<(), StoreError> {
        SlotRepo::save(&mut *self.tx, slot).await.map_err(store_error)
    }

    async fn delete_slot(&mut self, id: DbId) -> Result<bool, StoreError> {
        SlotRepo::delete(&mut *self.tx, id).await.map_err(store_error)
    }

    async fn insert_swap(&mut self, input: &NewSwapRequest) -> Result<SwapRequest, StoreError> {
        SwapRequestRepo::create(&mut *self.tx, input)
            .await
            .map_err(store_error)?
            .into_swap()
    }

    async fn find_swap(&mut self, id: DbId) -> Result<Option<SwapRequest>, StoreError> {
        SwapRequestRepo::find_by_id(&mut *self.tx, id)
            .await
            .map_err(store_error)?
            .map(|row| row.into_swap())
            .transpose()
    }

    async fn swap_for_update(&mut self, id: DbId) -> Result<Option<SwapRequest>, StoreError> {
        SwapRequestRepo::find_for_update(&mut *self.tx, id)
            .await
            .map_err(store_error)?
            .map(|row| row.into_swap())
            .transpose()
    }

    async fn pending_swap_for_slot(
        &mut self,
        slot_id: DbId,
    ) -> Result<Option<SwapRequest>, StoreError> {
        SwapRequestRepo::find_pending_for_slot(&mut *self.tx, slot_id)
            .await
            .map_err(store_error)?
            .map(|row| row.into_swap())
            .transpose()
    }

    async fn save_swap(&mut self, swap: &SwapRequest) -> Result<(), StoreError> {
        SwapRequestRepo::save(&mut *self.tx, swap)
            .await
            .map_err(store_error)
    }

    async fn delete_swap(&mut self, id: DbId) -> Result<bool, StoreError> {
        SwapRequestRepo::delete(&mut *self.tx, id)
            .await
            .map_err(store_error)
    }

    async fn delete_swaps_for_slot(&mut self, slot_id: DbId) -> Result<u64, StoreError> {
        SwapRequestRepo::delete_for_slot(&mut *self.tx, slot_id)
            .await
            .map_err(store_error)
    }

    async fn orphaned_pending_slots(&mut self) -> Result<Vec<Slot>, StoreError> {
        let rows = SlotRepo::orphaned_pending(&mut *self.tx)
            .await
            .map_err(store_error)?;
        into_slots(rows)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(store_error)
    }
}
