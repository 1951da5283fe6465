//! Slot swap marketplace domain core.
//!
//! - [`slot`] -- slot records, slot status, and owner-driven status rules.
//! - [`swap`] -- swap request records, swap status, and the proposal policy.
//! - [`store`] -- the transactional persistence abstraction and an in-memory store.
//! - [`notify`] -- the push-notification contract.
//! - [`registry`] -- the Slot Registry component.
//! - [`negotiator`] -- the Swap Negotiator component.

pub mod error;
pub mod negotiator;
pub mod notify;
pub mod registry;
pub mod slot;
pub mod store;
pub mod swap;
pub mod types;
pub mod user;

pub use error::CoreError;
pub use negotiator::Negotiator;
pub use registry::SlotRegistry;
