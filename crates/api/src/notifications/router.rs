//! Bus-to-WebSocket relay.

use std::sync::Arc;

use axum::extract::ws::Message;
use slotswap_events::UserNotification;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Relays [`UserNotification`]s from the event bus to WebSocket sessions.
///
/// Users without a live session simply miss the notification; nothing is
/// queued for later.
pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](slotswap_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<UserNotification>) {
        loop {
            match receiver.recv().await {
                Ok(notification) => {
                    self.deliver(&notification).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Push one notification to every session of its user.
    ///
    /// Returns the number of sessions reached.
    pub async fn deliver(&self, notification: &UserNotification) -> usize {
        let frame = notification.to_frame().to_string();
        let sent = self
            .ws_manager
            .send_to_user(notification.user_id, Message::Text(frame.into()))
            .await;

        if sent == 0 {
            tracing::debug!(
                user_id = notification.user_id,
                event = %notification.event,
                "No live session for notification"
            );
        } else {
            tracing::debug!(
                user_id = notification.user_id,
                event = %notification.event,
                sessions = sent,
                "Notification pushed"
            );
        }
        sent
    }
}
