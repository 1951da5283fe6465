//! Repository layer: one zero-sized struct per table.
//!
//! Read-only listings take the pool. Statements that participate in a
//! read-decide-write sequence take the transaction's connection.

pub mod slot_repo;
pub mod swap_request_repo;
pub mod user_repo;

pub use slot_repo::SlotRepo;
pub use swap_request_repo::SwapRequestRepo;
pub use user_repo::UserRepo;
