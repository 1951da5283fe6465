//! Periodic reconciliation of SWAP_PENDING slots.
//!
//! Releases slots left in SWAP_PENDING without a backing PENDING swap
//! request, such as those left behind by manual edits to the database.

use std::time::Duration;

use slotswap_core::Negotiator;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the reconciliation loop every `every` until `cancel` is triggered.
///
/// The first pass runs one full interval after start; `main` runs an
/// initial pass before serving.
pub async fn run(negotiator: Negotiator, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Reconciliation job started");

    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reconciliation job stopping");
                break;
            }
            _ = interval.tick() => {
                run_once(&negotiator).await;
            }
        }
    }
}

/// One reconciliation pass. Failures are logged, never propagated.
pub async fn run_once(negotiator: &Negotiator) -> usize {
    match negotiator.reconcile().await {
        Ok(released) if released.is_empty() => {
            tracing::debug!("Reconciliation: no orphaned slots");
            0
        }
        Ok(released) => {
            tracing::info!(count = released.len(), "Reconciliation: released orphaned slots");
            released.len()
        }
        Err(e) => {
            tracing::error!(error = %e, "Reconciliation failed");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use slotswap_core::notify::NullNotifier;
    use slotswap_core::store::{MemoryStore, SlotStore};
    use slotswap_core::swap::SwapPolicy;

    use super::*;

    #[tokio::test]
    async fn loop_stops_on_cancel() {
        let store: Arc<dyn SlotStore> = Arc::new(MemoryStore::new());
        let negotiator = Negotiator::new(store, Arc::new(NullNotifier), SwapPolicy::Strict);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run(negotiator, Duration::from_secs(3600), cancel.clone()));
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop should exit promptly")
            .expect("task should not panic");
    }

    #[tokio::test]
    async fn pass_on_clean_store_releases_nothing() {
        let store: Arc<dyn SlotStore> = Arc::new(MemoryStore::new());
        let negotiator = Negotiator::new(store, Arc::new(NullNotifier), SwapPolicy::Strict);
        assert_eq!(run_once(&negotiator).await, 0);
    }
}
