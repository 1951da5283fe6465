//! Push-notification contract consumed by the negotiator.
//!
//! Delivery is best-effort: there is no queuing for offline users, and a
//! failed delivery never rolls back the state transition that triggered it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::swap::SwapStatus;
use crate::types::DbId;

/// Sent to the target user when a swap is proposed to them.
pub const EVENT_NEW_REQUEST: &str = "new_request";

/// Sent to the requester when the target user responds.
pub const EVENT_REQUEST_RESPONSE: &str = "request_response";

/// A message pushed to every live session of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub event: String,
    pub message: String,
}

impl Notification {
    pub fn new_request(requester_name: Option<&str>) -> Self {
        let name = requester_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("a user");
        Self {
            event: EVENT_NEW_REQUEST.to_string(),
            message: format!("You have a new swap request from {name}"),
        }
    }

    pub fn request_response(status: SwapStatus) -> Self {
        Self {
            event: EVENT_REQUEST_RESPONSE.to_string(),
            message: format!(
                "Your swap request was {}",
                status.as_str().to_lowercase()
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("no live channel for user {0}")]
    NoListener(DbId),
}

/// Push channel keyed by user id.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: DbId, notification: &Notification)
        -> Result<(), NotifyError>;
}

/// Notifier that drops everything. Useful when no push channel is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _user_id: DbId, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}
