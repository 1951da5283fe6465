//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the application. The
//! negotiator publishes through the [`Notifier`] impl; the API's
//! notification router subscribes and relays to live WebSocket sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slotswap_core::notify::{Notification, Notifier, NotifyError};
use slotswap_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// UserNotification
// ---------------------------------------------------------------------------

/// A notification addressed to every live session of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotification {
    pub user_id: DbId,

    /// Event name, e.g. `"new_request"`.
    pub event: String,

    /// Human readable text shown to the user.
    pub message: String,

    /// When the notification was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl UserNotification {
    pub fn new(user_id: DbId, notification: &Notification) -> Self {
        Self {
            user_id,
            event: notification.event.clone(),
            message: notification.message.clone(),
            timestamp: Utc::now(),
        }
    }

    /// The JSON frame pushed to the client: `{"event", "message", "timestamp"}`.
    pub fn to_frame(&self) -> serde_json::Value {
        serde_json::json!({
            "event": self.event,
            "message": self.message,
            "timestamp": self.timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use slotswap_core::notify::Notification;
/// use slotswap_events::bus::{EventBus, UserNotification};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(UserNotification::new(7, &Notification::new_request(Some("Alice"))));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<UserNotification>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notification to all current subscribers.
    ///
    /// Returns the number of subscribers that will see it. Zero means the
    /// notification was dropped.
    pub fn publish(&self, notification: UserNotification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    /// Subscribe to all notifications published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<UserNotification> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Notifier for EventBus {
    async fn notify(&self, user_id: DbId, notification: &Notification) -> Result<(), NotifyError> {
        match self.publish(UserNotification::new(user_id, notification)) {
            0 => Err(NotifyError::NoListener(user_id)),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
