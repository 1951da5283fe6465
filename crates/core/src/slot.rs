//! Slot records and the owner-driven status rules.
//!
//! A slot moves through three statuses:
//!
//! ```text
//! BUSY <-> SWAPPABLE            (direct owner toggle)
//! SWAPPABLE -> SWAP_PENDING     (swap proposal, both slots of the pair)
//! SWAP_PENDING -> SWAPPABLE     (reject, cancel, or stale accept)
//! SWAP_PENDING -> BUSY          (accept, with ownership transfer)
//! ```
//!
//! Only the negotiator moves a slot into or out of `SWAP_PENDING`. This
//! module classifies a direct status request so the registry knows whether
//! it is a plain toggle, a no-op, or a cancellation that must tear down the
//! pending swap first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Lifecycle status of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    /// Owned and not offered for exchange. Default for new slots.
    Busy,
    /// Offered for exchange and visible in the marketplace.
    Swappable,
    /// Locked by exactly one pending swap request.
    SwapPending,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Busy => "BUSY",
            SlotStatus::Swappable => "SWAPPABLE",
            SlotStatus::SwapPending => "SWAP_PENDING",
        }
    }

    /// Whether a pending swap currently holds this slot.
    #[inline]
    pub fn is_locked(&self) -> bool {
        matches!(self, SlotStatus::SwapPending)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUSY" => Ok(SlotStatus::Busy),
            "SWAPPABLE" => Ok(SlotStatus::Swappable),
            "SWAP_PENDING" => Ok(SlotStatus::SwapPending),
            other => Err(CoreError::Validation(format!(
                "Invalid slot status '{other}'. Must be one of: BUSY, SWAPPABLE, SWAP_PENDING"
            ))),
        }
    }
}

/// One schedulable time block owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status: SlotStatus,
    pub created_at: Timestamp,
}

/// A validated slot ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewSlot {
    pub owner_id: DbId,
    pub title: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status: SlotStatus,
}

/// Raw slot creation input as received from a caller. Every field may be
/// missing; [`CreateSlot::validate`] turns it into a [`NewSlot`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSlot {
    pub title: Option<String>,
    #[serde(alias = "startTime")]
    pub start_time: Option<Timestamp>,
    #[serde(alias = "endTime")]
    pub end_time: Option<Timestamp>,
    pub status: Option<SlotStatus>,
}

impl CreateSlot {
    pub fn validate(self, owner_id: DbId) -> Result<NewSlot, CoreError> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::Validation("title is required".into()))?;
        let start_time = self
            .start_time
            .ok_or_else(|| CoreError::Validation("start_time is required".into()))?;
        let end_time = self
            .end_time
            .ok_or_else(|| CoreError::Validation("end_time is required".into()))?;

        if end_time <= start_time {
            return Err(CoreError::Validation(
                "end_time must be after start_time".into(),
            ));
        }

        let status = self.status.unwrap_or(SlotStatus::Busy);
        if status.is_locked() {
            return Err(CoreError::Validation(
                "a new slot cannot start in SWAP_PENDING".into(),
            ));
        }

        Ok(NewSlot {
            owner_id,
            title,
            start_time,
            end_time,
            status,
        })
    }
}

/// What a direct owner status request amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Requested status equals the current one.
    Unchanged,
    /// BUSY <-> SWAPPABLE, applied directly.
    Toggle,
    /// Leaving SWAP_PENDING; the pending swap must be torn down first.
    Cancellation,
}

/// Classify an owner's request to move a slot from `current` to `requested`.
///
/// Entering `SWAP_PENDING` directly is a conflict: only a swap proposal may
/// lock a slot.
pub fn classify_status_change(
    current: SlotStatus,
    requested: SlotStatus,
) -> Result<StatusChange, CoreError> {
    if current == requested {
        return Ok(StatusChange::Unchanged);
    }
    match (current, requested) {
        (_, SlotStatus::SwapPending) => Err(CoreError::Conflict(
            "a slot can only become SWAP_PENDING through a swap proposal".into(),
        )),
        (SlotStatus::SwapPending, _) => Ok(StatusChange::Cancellation),
        _ => Ok(StatusChange::Toggle),
    }
}
