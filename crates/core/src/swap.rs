//! Swap request records, swap status, and the proposal policy.
//!
//! A swap request is PENDING from proposal until the target owner responds
//! (ACCEPTED / REJECTED) or either owner cancels it. Resolved requests are
//! immutable history; cancelled and stale requests are deleted outright.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::slot::{Slot, SlotStatus};
use crate::types::{DbId, Timestamp};

/// Status of a swap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "PENDING",
            SwapStatus::Accepted => "ACCEPTED",
            SwapStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SwapStatus::Pending),
            "ACCEPTED" => Ok(SwapStatus::Accepted),
            "REJECTED" => Ok(SwapStatus::Rejected),
            other => Err(CoreError::Validation(format!(
                "Invalid swap status '{other}'. Must be one of: PENDING, ACCEPTED, REJECTED"
            ))),
        }
    }
}

/// A proposed exchange of ownership between two slots of two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: DbId,
    pub requester_id: DbId,
    pub requester_slot_id: DbId,
    /// Owner of the target slot at proposal time.
    pub target_user_id: DbId,
    pub target_slot_id: DbId,
    pub status: SwapStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SwapRequest {
    /// Whether `slot_id` is one of the two slots in this request.
    pub fn references(&self, slot_id: DbId) -> bool {
        self.requester_slot_id == slot_id || self.target_slot_id == slot_id
    }

    /// The slot paired with `slot_id`, if `slot_id` belongs to this request.
    pub fn counterpart_slot(&self, slot_id: DbId) -> Option<DbId> {
        if self.requester_slot_id == slot_id {
            Some(self.target_slot_id)
        } else if self.target_slot_id == slot_id {
            Some(self.requester_slot_id)
        } else {
            None
        }
    }
}

/// A swap request ready to be inserted as PENDING.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSwapRequest {
    pub requester_id: DbId,
    pub requester_slot_id: DbId,
    pub target_user_id: DbId,
    pub target_slot_id: DbId,
}

/// How strictly a proposal checks slot availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapPolicy {
    /// Both slots must be SWAPPABLE inside the proposal transaction.
    #[default]
    Strict,
    /// Slot statuses are not checked at proposal time.
    Loose,
}

impl FromStr for SwapPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SwapPolicy::Strict),
            "loose" => Ok(SwapPolicy::Loose),
            other => Err(CoreError::Validation(format!(
                "Invalid swap policy '{other}'. Must be 'strict' or 'loose'"
            ))),
        }
    }
}

/// Decide whether `requester` may propose swapping `mine` for `theirs`.
///
/// Both slots must already be locked by the caller's transaction.
pub fn check_proposal(
    policy: SwapPolicy,
    requester: DbId,
    mine: &Slot,
    theirs: &Slot,
) -> Result<NewSwapRequest, CoreError> {
    if mine.id == theirs.id {
        return Err(CoreError::Validation(
            "a slot cannot be swapped with itself".into(),
        ));
    }
    if mine.owner_id != requester {
        return Err(CoreError::slot_not_found(mine.id));
    }
    if theirs.owner_id == requester {
        return Err(CoreError::Validation(
            "cannot propose a swap against your own slot".into(),
        ));
    }

    if policy == SwapPolicy::Strict {
        for slot in [mine, theirs] {
            if slot.status != SlotStatus::Swappable {
                return Err(CoreError::Conflict(format!(
                    "slot {} is {}, not SWAPPABLE",
                    slot.id, slot.status
                )));
            }
        }
    }

    Ok(NewSwapRequest {
        requester_id: requester,
        requester_slot_id: mine.id,
        target_user_id: theirs.owner_id,
        target_slot_id: theirs.id,
    })
}

/// Title and start time of a slot referenced by a swap request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotBrief {
    pub id: DbId,
    pub title: String,
    pub start_time: Timestamp,
}

/// A swap request enriched for presentation.
///
/// The slot briefs are `None` when the slot has since been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapSummary {
    #[serde(flatten)]
    pub swap: SwapRequest,
    /// Display name of the other party (the requester for incoming
    /// requests, the target user for outgoing ones).
    pub counterpart_name: Option<String>,
    pub requester_slot: Option<SlotBrief>,
    pub target_slot: Option<SlotBrief>,
}

/// A user's swap requests split by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SwapListing {
    pub incoming: Vec<SwapSummary>,
    pub outgoing: Vec<SwapSummary>,
}

/// Result of a successful response to a swap request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapResolution {
    pub message: String,
    pub swap: SwapRequest,
}
