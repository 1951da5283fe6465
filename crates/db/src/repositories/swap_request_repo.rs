//! Repository for the `swap_requests` table.

use slotswap_core::swap::{NewSwapRequest, SwapRequest, SwapStatus};
use slotswap_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::swap_request::{SwapRequestRow, SwapSummaryRow};

/// Column list for `swap_requests` queries.
const COLUMNS: &str = "\
    id, requester_id, requester_slot_id, target_user_id, target_slot_id, \
    status, created_at, updated_at";

/// Which side of a request the listing user is on.
#[derive(Debug, Clone, Copy)]
pub enum Direction {
    /// The user is the target; the counterpart is the requester.
    Incoming,
    /// The user is the requester; the counterpart is the target user.
    Outgoing,
}

impl Direction {
    fn user_column(self) -> &'static str {
        match self {
            Direction::Incoming => "target_user_id",
            Direction::Outgoing => "requester_id",
        }
    }

    fn counterpart_column(self) -> &'static str {
        match self {
            Direction::Incoming => "requester_id",
            Direction::Outgoing => "target_user_id",
        }
    }
}

pub struct SwapRequestRepo;

impl SwapRequestRepo {
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewSwapRequest,
    ) -> Result<SwapRequestRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO swap_requests \
                 (requester_id, requester_slot_id, target_user_id, target_slot_id, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SwapRequestRow>(&query)
            .bind(input.requester_id)
            .bind(input.requester_slot_id)
            .bind(input.target_user_id)
            .bind(input.target_slot_id)
            .bind(SwapStatus::Pending.as_str())
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<SwapRequestRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM swap_requests WHERE id = $1");
        sqlx::query_as::<_, SwapRequestRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Load a request and lock its row until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<SwapRequestRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM swap_requests WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, SwapRequestRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// The PENDING request referencing `slot_id` on either side. Does not
    /// lock; slots are locked before requests.
    pub async fn find_pending_for_slot(
        conn: &mut PgConnection,
        slot_id: DbId,
    ) -> Result<Option<SwapRequestRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM swap_requests \
             WHERE status = $2 AND (requester_slot_id = $1 OR target_slot_id = $1) \
             ORDER BY id \
             LIMIT 1"
        );
        sqlx::query_as::<_, SwapRequestRow>(&query)
            .bind(slot_id)
            .bind(SwapStatus::Pending.as_str())
            .fetch_optional(conn)
            .await
    }

    /// Persist status and `updated_at` of a loaded request.
    pub async fn save(conn: &mut PgConnection, swap: &SwapRequest) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE swap_requests SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(swap.id)
            .bind(swap.status.as_str())
            .bind(swap.updated_at)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM swap_requests WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every request, in any status, that references `slot_id`.
    pub async fn delete_for_slot(conn: &mut PgConnection, slot_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM swap_requests WHERE requester_slot_id = $1 OR target_slot_id = $1",
        )
        .bind(slot_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Requests on one side for `user_id`, newest first, joined with the
    /// counterpart's name and both slots where they still exist.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        direction: Direction,
    ) -> Result<Vec<SwapSummaryRow>, sqlx::Error> {
        let query = format!(
            "SELECT r.id, r.requester_id, r.requester_slot_id, r.target_user_id, \
                    r.target_slot_id, r.status, r.created_at, r.updated_at, \
                    cu.name AS counterpart_name, \
                    rs.title AS requester_slot_title, rs.start_time AS requester_slot_start, \
                    ts.title AS target_slot_title, ts.start_time AS target_slot_start \
             FROM swap_requests r \
             LEFT JOIN users cu ON cu.id = r.{counterpart} \
             LEFT JOIN slots rs ON rs.id = r.requester_slot_id \
             LEFT JOIN slots ts ON ts.id = r.target_slot_id \
             WHERE r.{user} = $1 \
             ORDER BY r.created_at DESC, r.id DESC",
            counterpart = direction.counterpart_column(),
            user = direction.user_column(),
        );
        sqlx::query_as::<_, SwapSummaryRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
