//! Swap request rows and the joined listing row.

use slotswap_core::store::StoreError;
use slotswap_core::swap::{SlotBrief, SwapRequest, SwapStatus, SwapSummary};
use slotswap_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::corrupt_status;

/// A row from the `swap_requests` table.
#[derive(Debug, Clone, FromRow)]
pub struct SwapRequestRow {
    pub id: DbId,
    pub requester_id: DbId,
    pub requester_slot_id: DbId,
    pub target_user_id: DbId,
    pub target_slot_id: DbId,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SwapRequestRow {
    pub fn into_swap(self) -> Result<SwapRequest, StoreError> {
        let status: SwapStatus = self
            .status
            .parse()
            .map_err(|_| corrupt_status("swap_requests", &self.status))?;
        Ok(SwapRequest {
            id: self.id,
            requester_id: self.requester_id,
            requester_slot_id: self.requester_slot_id,
            target_user_id: self.target_user_id,
            target_slot_id: self.target_slot_id,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// A swap request joined with the counterpart's name and both slots.
///
/// Slot columns are nullable because a slot may have been deleted since the
/// request was made.
#[derive(Debug, Clone, FromRow)]
pub struct SwapSummaryRow {
    #[sqlx(flatten)]
    pub swap: SwapRequestRow,
    pub counterpart_name: Option<String>,
    pub requester_slot_title: Option<String>,
    pub requester_slot_start: Option<Timestamp>,
    pub target_slot_title: Option<String>,
    pub target_slot_start: Option<Timestamp>,
}

impl SwapSummaryRow {
    pub fn into_summary(self) -> Result<SwapSummary, StoreError> {
        let requester_slot = brief(
            self.swap.requester_slot_id,
            self.requester_slot_title,
            self.requester_slot_start,
        );
        let target_slot = brief(
            self.swap.target_slot_id,
            self.target_slot_title,
            self.target_slot_start,
        );
        Ok(SwapSummary {
            swap: self.swap.into_swap()?,
            counterpart_name: self.counterpart_name,
            requester_slot,
            target_slot,
        })
    }
}

fn brief(id: DbId, title: Option<String>, start_time: Option<Timestamp>) -> Option<SlotBrief> {
    Some(SlotBrief {
        id,
        title: title?,
        start_time: start_time?,
    })
}
