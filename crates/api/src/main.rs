use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use slotswap_core::store::{MemoryStore, SlotStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slotswap_api::background;
use slotswap_api::config::ServerConfig;
use slotswap_api::notifications::NotificationRouter;
use slotswap_api::router::build_app_router;
use slotswap_api::state::AppState;
use slotswap_api::ws;
use slotswap_events::EventBus;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slotswap_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        swap_policy = ?config.swap_policy,
        "Loaded server configuration"
    );

    // --- Store ---
    let store = open_store(&config).await;

    // --- WebSocket manager + heartbeat ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_cancel = CancellationToken::new();
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), heartbeat_cancel.clone());

    // --- Event bus + notification router ---
    let event_bus = Arc::new(EventBus::default());
    let notification_router = NotificationRouter::new(Arc::clone(&ws_manager));
    let router_handle = tokio::spawn(notification_router.run(event_bus.subscribe()));
    tracing::info!("Notification router started");

    // --- App state ---
    let config = Arc::new(config);
    let state = AppState::new(
        store,
        Arc::clone(&config),
        Arc::clone(&ws_manager),
        Arc::clone(&event_bus),
    );

    // --- Reconciliation: once now, then periodically ---
    background::reconcile::run_once(&state.negotiator).await;
    let reconcile_cancel = CancellationToken::new();
    let reconcile_handle = tokio::spawn(background::reconcile::run(
        state.negotiator.clone(),
        Duration::from_secs(config.reconcile_interval_secs),
        reconcile_cancel.clone(),
    ));

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let grace = Duration::from_secs(config.shutdown_timeout_secs);

    reconcile_cancel.cancel();
    let _ = tokio::time::timeout(grace, reconcile_handle).await;
    tracing::info!("Reconciliation job stopped");

    // The router exits once every bus sender is gone; app state clones
    // holding the bus were dropped with the server.
    drop(event_bus);
    let _ = tokio::time::timeout(grace, router_handle).await;
    tracing::info!("Notification router stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_cancel.cancel();
    let _ = heartbeat_handle.await;
    tracing::info!("Graceful shutdown complete");
}

/// Open the PostgreSQL store when `DATABASE_URL` is set, otherwise fall back
/// to the in-memory store.
async fn open_store(config: &ServerConfig) -> Arc<dyn SlotStore> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on exit)");
        return Arc::new(MemoryStore::new());
    };

    let pool = slotswap_db::create_pool(database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    slotswap_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    slotswap_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    Arc::new(slotswap_db::PgSlotStore::new(pool))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
