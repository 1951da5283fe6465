//! Slot rows and the marketplace listing row.

use slotswap_core::slot::{Slot, SlotStatus};
use slotswap_core::store::{StoreError, SwappableSlot};
use slotswap_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::corrupt_status;

/// A row from the `slots` table.
#[derive(Debug, Clone, FromRow)]
pub struct SlotRow {
    pub id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status: String,
    pub created_at: Timestamp,
}

impl SlotRow {
    pub fn into_slot(self) -> Result<Slot, StoreError> {
        let status: SlotStatus = self
            .status
            .parse()
            .map_err(|_| corrupt_status("slots", &self.status))?;
        Ok(Slot {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            start_time: self.start_time,
            end_time: self.end_time,
            status,
            created_at: self.created_at,
        })
    }
}

/// A SWAPPABLE slot joined with its owner.
#[derive(Debug, Clone, FromRow)]
pub struct SwappableSlotRow {
    #[sqlx(flatten)]
    pub slot: SlotRow,
    pub owner_name: String,
    pub owner_email: String,
}

impl SwappableSlotRow {
    pub fn into_swappable(self) -> Result<SwappableSlot, StoreError> {
        Ok(SwappableSlot {
            slot: self.slot.into_slot()?,
            owner_name: self.owner_name,
            owner_email: self.owner_email,
        })
    }
}
