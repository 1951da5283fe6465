//! Slot swap event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. Implements
//!   [`Notifier`](slotswap_core::notify::Notifier) so the negotiator can
//!   publish without knowing how notifications reach users.
//! - [`UserNotification`]: the envelope carried on the bus, addressed to
//!   one user.

pub mod bus;

pub use bus::{EventBus, UserNotification};
