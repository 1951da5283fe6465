//! Repository for the `slots` table.

use slotswap_core::slot::{NewSlot, Slot, SlotStatus};
use slotswap_core::swap::SwapStatus;
use slotswap_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::slot::{SlotRow, SwappableSlotRow};

/// Column list for `slots` queries.
const COLUMNS: &str = "id, owner_id, title, start_time, end_time, status, created_at";

/// Same columns qualified with the `s` alias for joins.
const JOINED_COLUMNS: &str = "\
    s.id, s.owner_id, s.title, s.start_time, s.end_time, s.status, s.created_at";

pub struct SlotRepo;

impl SlotRepo {
    pub async fn create(conn: &mut PgConnection, input: &NewSlot) -> Result<SlotRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO slots (owner_id, title, start_time, end_time, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SlotRow>(&query)
            .bind(input.owner_id)
            .bind(&input.title)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.status.as_str())
            .fetch_one(conn)
            .await
    }

    /// Load a slot and lock its row until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<SlotRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM slots WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, SlotRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Persist owner and status of a loaded slot.
    pub async fn save(conn: &mut PgConnection, slot: &Slot) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE slots SET owner_id = $2, status = $3 WHERE id = $1")
            .bind(slot.id)
            .bind(slot.owner_id)
            .bind(slot.status.as_str())
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_by_owner(pool: &PgPool, owner_id: DbId) -> Result<Vec<SlotRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM slots \
             WHERE owner_id = $1 \
             ORDER BY start_time ASC, id ASC"
        );
        sqlx::query_as::<_, SlotRow>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// SWAPPABLE slots of every owner but `exclude_owner`, with owner info.
    pub async fn list_swappable(
        pool: &PgPool,
        exclude_owner: DbId,
    ) -> Result<Vec<SwappableSlotRow>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}, u.name AS owner_name, u.email AS owner_email \
             FROM slots s \
             JOIN users u ON u.id = s.owner_id \
             WHERE s.status = $1 AND s.owner_id <> $2 \
             ORDER BY s.start_time ASC, s.id ASC"
        );
        sqlx::query_as::<_, SwappableSlotRow>(&query)
            .bind(SlotStatus::Swappable.as_str())
            .bind(exclude_owner)
            .fetch_all(pool)
            .await
    }

    /// SWAP_PENDING slots that no PENDING request references, locked.
    pub async fn orphaned_pending(conn: &mut PgConnection) -> Result<Vec<SlotRow>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM slots s \
             WHERE s.status = $1 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM swap_requests r \
                   WHERE r.status = $2 \
                     AND (r.requester_slot_id = s.id OR r.target_slot_id = s.id) \
               ) \
             ORDER BY s.id \
             FOR UPDATE OF s"
        );
        sqlx::query_as::<_, SlotRow>(&query)
            .bind(SlotStatus::SwapPending.as_str())
            .bind(SwapStatus::Pending.as_str())
            .fetch_all(conn)
            .await
    }
}
