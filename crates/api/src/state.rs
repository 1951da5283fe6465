use std::sync::Arc;

use slotswap_core::notify::Notifier;
use slotswap_core::store::SlotStore;
use slotswap_core::{Negotiator, SlotRegistry};
use slotswap_events::EventBus;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or is itself a
/// cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Slot, swap, and user persistence.
    pub store: Arc<dyn SlotStore>,
    /// Slot lifecycle operations.
    pub registry: SlotRegistry,
    /// Swap request operations. Publishes notifications to `event_bus`.
    pub negotiator: Negotiator,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// In-process bus carrying user notifications.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// Wire the registry and negotiator to `store`, with the negotiator
    /// publishing notifications on `event_bus`.
    pub fn new(
        store: Arc<dyn SlotStore>,
        config: Arc<ServerConfig>,
        ws_manager: Arc<WsManager>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let notifier: Arc<dyn Notifier> = event_bus.clone();
        Self {
            registry: SlotRegistry::new(Arc::clone(&store)),
            negotiator: Negotiator::new(Arc::clone(&store), notifier, config.swap_policy),
            store,
            config,
            ws_manager,
            event_bus,
        }
    }
}
