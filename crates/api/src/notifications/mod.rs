//! Notification routing infrastructure.
//!
//! The [`NotificationRouter`] subscribes to the event bus and pushes each
//! user notification to that user's live WebSocket sessions.

pub mod router;

pub use router::NotificationRouter;
