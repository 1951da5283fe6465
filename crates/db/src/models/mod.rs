//! Row types for the marketplace tables.
//!
//! Status columns are stored as text and parsed on the way out, so every row
//! type converts into its domain counterpart through a fallible `into_*`.

pub mod slot;
pub mod swap_request;
pub mod user;

use slotswap_core::store::StoreError;

/// Report a status string the schema's CHECK constraints should have rejected.
pub(crate) fn corrupt_status(table: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("unexpected status '{value}' in {table}"))
}
