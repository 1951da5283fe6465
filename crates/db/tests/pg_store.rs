//! Integration tests for the PostgreSQL store.
//!
//! These need a live database (`DATABASE_URL`) and are ignored by default:
//! `cargo test -p slotswap-db -- --ignored`.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use slotswap_core::error::CoreError;
use slotswap_core::notify::NullNotifier;
use slotswap_core::slot::{CreateSlot, SlotStatus};
use slotswap_core::store::{SlotStore, StoreError};
use slotswap_core::swap::{SwapPolicy, SwapStatus};
use slotswap_core::types::DbId;
use slotswap_core::user::NewUser;
use slotswap_core::{Negotiator, SlotRegistry};
use slotswap_db::PgSlotStore;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn store(pool: PgPool) -> Arc<dyn SlotStore> {
    Arc::new(PgSlotStore::new(pool))
}

async fn user(store: &Arc<dyn SlotStore>, name: &str) -> DbId {
    store
        .create_user(&NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap()
        .id
}

fn slot_input(title: &str, day: u32) -> CreateSlot {
    let start = Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap();
    CreateSlot {
        title: Some(title.to_string()),
        start_time: Some(start),
        end_time: Some(start + Duration::hours(1)),
        status: Some(SlotStatus::Swappable),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_email_is_rejected_case_insensitively(pool: PgPool) {
    let store = store(pool);
    user(&store, "Alice").await;

    let result = store
        .create_user(&NewUser {
            name: "Other".to_string(),
            email: "ALICE@example.com".to_string(),
            password_hash: "hash".to_string(),
        })
        .await;
    assert_matches!(result, Err(StoreError::Duplicate(_)));

    let found = store.find_user_by_email("Alice@Example.com").await.unwrap();
    assert_eq!(found.map(|u| u.name).as_deref(), Some("Alice"));
}

// ---------------------------------------------------------------------------
// Swap lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn accepted_swap_exchanges_owners(pool: PgPool) {
    let store = store(pool);
    let registry = SlotRegistry::new(Arc::clone(&store));
    let negotiator = Negotiator::new(Arc::clone(&store), Arc::new(NullNotifier), SwapPolicy::Strict);

    let alice = user(&store, "Alice").await;
    let bob = user(&store, "Bob").await;
    let a = registry.create_slot(alice, slot_input("Standup", 2)).await.unwrap();
    let b = registry.create_slot(bob, slot_input("Review", 3)).await.unwrap();

    let swap = negotiator.propose(alice, a.id, b.id).await.unwrap();
    assert_eq!(swap.status, SwapStatus::Pending);

    let listing = negotiator.list_for(bob).await.unwrap();
    assert_eq!(listing.incoming.len(), 1);
    assert_eq!(listing.incoming[0].counterpart_name.as_deref(), Some("Alice"));
    assert_eq!(
        listing.incoming[0].requester_slot.as_ref().map(|s| s.title.as_str()),
        Some("Standup")
    );

    let resolution = negotiator.respond(bob, swap.id, true).await.unwrap();
    assert_eq!(resolution.swap.status, SwapStatus::Accepted);

    let alice_slots = registry.list_owned(alice).await.unwrap();
    assert_eq!(alice_slots.len(), 1);
    assert_eq!(alice_slots[0].id, b.id);
    assert_eq!(alice_slots[0].status, SlotStatus::Busy);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn cancellation_releases_the_pair_and_deletes_the_request(pool: PgPool) {
    let store = store(pool);
    let registry = SlotRegistry::new(Arc::clone(&store));
    let negotiator = Negotiator::new(Arc::clone(&store), Arc::new(NullNotifier), SwapPolicy::Strict);

    let alice = user(&store, "Alice").await;
    let bob = user(&store, "Bob").await;
    let a = registry.create_slot(alice, slot_input("Standup", 2)).await.unwrap();
    let b = registry.create_slot(bob, slot_input("Review", 3)).await.unwrap();
    negotiator.propose(alice, a.id, b.id).await.unwrap();

    let cancelled = negotiator.cancel(alice, a.id, SlotStatus::Busy).await.unwrap();
    assert_eq!(cancelled.status, SlotStatus::Busy);

    let market = registry.list_swappable(alice).await.unwrap();
    assert_eq!(market.len(), 1);
    assert_eq!(market[0].slot.id, b.id);
    assert_eq!(market[0].owner_email, "bob@example.com");

    let listing = negotiator.list_for(alice).await.unwrap();
    assert!(listing.outgoing.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn stale_accept_releases_survivor(pool: PgPool) {
    let store = store(pool.clone());
    let registry = SlotRegistry::new(Arc::clone(&store));
    let negotiator = Negotiator::new(Arc::clone(&store), Arc::new(NullNotifier), SwapPolicy::Strict);

    let alice = user(&store, "Alice").await;
    let bob = user(&store, "Bob").await;
    let a = registry.create_slot(alice, slot_input("Standup", 2)).await.unwrap();
    let b = registry.create_slot(bob, slot_input("Review", 3)).await.unwrap();
    let swap = negotiator.propose(alice, a.id, b.id).await.unwrap();

    sqlx::query("DELETE FROM slots WHERE id = $1")
        .bind(a.id)
        .execute(&pool)
        .await
        .unwrap();

    let result = negotiator.respond(bob, swap.id, true).await;
    assert_matches!(result, Err(CoreError::StaleSwap { swap_id }) if swap_id == swap.id);

    let bob_slots = registry.list_owned(bob).await.unwrap();
    assert_eq!(bob_slots[0].status, SlotStatus::Swappable);
    assert!(negotiator.list_for(bob).await.unwrap().incoming.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn reconcile_releases_orphaned_pending_slot(pool: PgPool) {
    let store = store(pool.clone());
    let registry = SlotRegistry::new(Arc::clone(&store));
    let negotiator = Negotiator::new(Arc::clone(&store), Arc::new(NullNotifier), SwapPolicy::Strict);

    let alice = user(&store, "Alice").await;
    let a = registry.create_slot(alice, slot_input("Standup", 2)).await.unwrap();
    sqlx::query("UPDATE slots SET status = 'SWAP_PENDING' WHERE id = $1")
        .bind(a.id)
        .execute(&pool)
        .await
        .unwrap();

    let released = negotiator.reconcile().await.unwrap();
    assert_eq!(released, vec![a.id]);
    assert!(negotiator.reconcile().await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn accept_racing_owner_cancel_never_deadlocks(pool: PgPool) {
    let store = store(pool);
    let registry = SlotRegistry::new(Arc::clone(&store));
    let negotiator = Negotiator::new(Arc::clone(&store), Arc::new(NullNotifier), SwapPolicy::Strict);

    let alice = user(&store, "Alice").await;
    let bob = user(&store, "Bob").await;

    for round in 0..50u32 {
        let day = round % 28 + 1;
        let a = registry.create_slot(alice, slot_input("Standup", day)).await.unwrap();
        let b = registry.create_slot(bob, slot_input("Review", day)).await.unwrap();
        let swap = negotiator.propose(alice, a.id, b.id).await.unwrap();

        let (accepted, cancelled) = tokio::join!(
            negotiator.respond(bob, swap.id, true),
            registry.set_status(a.id, alice, SlotStatus::Busy),
        );

        match (&accepted, &cancelled) {
            (Ok(resolution), Err(CoreError::NotFound { .. })) => {
                assert_eq!(resolution.swap.status, SwapStatus::Accepted);
            }
            (Err(CoreError::NotFound { .. }), Ok(slot)) => {
                assert_eq!(slot.status, SlotStatus::Busy);
            }
            other => panic!("round {round}: unexpected outcome {other:?}"),
        }
    }

    assert!(negotiator.reconcile().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn overlapping_proposals_lock_each_slot_once(pool: PgPool) {
    let store = store(pool);
    let registry = SlotRegistry::new(Arc::clone(&store));
    let negotiator = Negotiator::new(Arc::clone(&store), Arc::new(NullNotifier), SwapPolicy::Strict);

    let alice = user(&store, "Alice").await;
    let bob = user(&store, "Bob").await;
    let carol = user(&store, "Carol").await;

    for round in 0..50u32 {
        let day = round % 28 + 1;
        let a = registry.create_slot(alice, slot_input("a", day)).await.unwrap();
        let b = registry.create_slot(bob, slot_input("b", day)).await.unwrap();
        let c = registry.create_slot(carol, slot_input("c", day)).await.unwrap();

        // Every pair of proposals shares a slot.
        let (first, second, third) = tokio::join!(
            negotiator.propose(alice, a.id, b.id),
            negotiator.propose(carol, c.id, b.id),
            negotiator.propose(bob, b.id, a.id),
        );
        let results = [first, second, third];

        assert_eq!(
            results.iter().filter(|r| r.is_ok()).count(),
            1,
            "round {round}: {results:?}"
        );
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(CoreError::Conflict(_))))
                .count(),
            2,
            "round {round}: {results:?}"
        );
    }

    assert!(negotiator.reconcile().await.unwrap().is_empty());
}
