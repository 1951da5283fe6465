//! HTTP-level integration tests for the swap request workflow.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_slot, get_auth, post_json_auth, put_json_auth, TestApp, TestUser};
use serde_json::{json, Value};
use slotswap_core::store::{SlotStore, StoreTx};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Alice and Bob, each with one SWAPPABLE slot.
struct Pair {
    app: TestApp,
    alice: TestUser,
    bob: TestUser,
    alice_slot: i64,
    bob_slot: i64,
}

async fn pair() -> Pair {
    let app = common::build_test_app();
    let alice = common::signup(&app, "Alice").await;
    let bob = common::signup(&app, "Bob").await;
    let alice_slot = create_slot(&app, &alice, "Standup", 2, "SWAPPABLE").await;
    let bob_slot = create_slot(&app, &bob, "Review", 3, "SWAPPABLE").await;
    Pair {
        app,
        alice,
        bob,
        alice_slot,
        bob_slot,
    }
}

async fn propose(p: &Pair) -> Value {
    let response = post_json_auth(
        p.app.app(),
        "/api/v1/swap-requests",
        json!({ "my_slot_id": p.alice_slot, "their_slot_id": p.bob_slot }),
        &p.alice.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn respond(app: &TestApp, user: &TestUser, swap_id: i64, accept: bool) -> axum::response::Response {
    post_json_auth(
        app.app(),
        &format!("/api/v1/swap-requests/{swap_id}/response"),
        json!({ "accept": accept }),
        &user.token,
    )
    .await
}

async fn slots_of(app: &TestApp, user: &TestUser) -> Vec<Value> {
    let json = body_json(get_auth(app.app(), "/api/v1/slots", &user.token).await).await;
    json["data"].as_array().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Propose
// ---------------------------------------------------------------------------

#[tokio::test]
async fn proposal_locks_both_slots() {
    let p = pair().await;

    let swap = propose(&p).await;
    assert_eq!(swap["status"], "PENDING");
    assert_eq!(swap["requester_id"], p.alice.id);
    assert_eq!(swap["target_user_id"], p.bob.id);

    assert_eq!(slots_of(&p.app, &p.alice).await[0]["status"], "SWAP_PENDING");
    assert_eq!(slots_of(&p.app, &p.bob).await[0]["status"], "SWAP_PENDING");

    let incoming = body_json(get_auth(p.app.app(), "/api/v1/swap-requests", &p.bob.token).await).await;
    assert_eq!(incoming["data"]["incoming"].as_array().unwrap().len(), 1);
    assert_eq!(incoming["data"]["incoming"][0]["counterpart_name"], "Alice");
    assert_eq!(incoming["data"]["incoming"][0]["requester_slot"]["title"], "Standup");
    assert!(incoming["data"]["outgoing"].as_array().unwrap().is_empty());

    let outgoing = body_json(get_auth(p.app.app(), "/api/v1/swap-requests", &p.alice.token).await).await;
    assert_eq!(outgoing["data"]["outgoing"][0]["counterpart_name"], "Bob");
    assert_eq!(outgoing["data"]["outgoing"][0]["target_slot"]["title"], "Review");
}

#[tokio::test]
async fn proposal_accepts_camel_case_fields() {
    let p = pair().await;

    let response = post_json_auth(
        p.app.app(),
        "/api/v1/swap-requests",
        json!({ "mySlotId": p.alice_slot, "theirSlotId": p.bob_slot }),
        &p.alice.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn proposal_rejects_bad_input() {
    let p = pair().await;
    let uri = "/api/v1/swap-requests";

    let response = post_json_auth(p.app.app(), uri, json!({ "my_slot_id": p.alice_slot }), &p.alice.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let same = json!({ "my_slot_id": p.alice_slot, "their_slot_id": p.alice_slot });
    let response = post_json_auth(p.app.app(), uri, same, &p.alice.token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Offering Bob's slot as if it were Alice's.
    let stolen = json!({ "my_slot_id": p.bob_slot, "their_slot_id": p.alice_slot });
    let response = post_json_auth(p.app.app(), uri, stolen, &p.alice.token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let missing = json!({ "my_slot_id": p.alice_slot, "their_slot_id": 9999 });
    let response = post_json_auth(p.app.app(), uri, missing, &p.alice.token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn proposal_against_busy_slot_conflicts() {
    let p = pair().await;
    let busy = create_slot(&p.app, &p.bob, "Dentist", 4, "BUSY").await;

    let response = post_json_auth(
        p.app.app(),
        "/api/v1/swap-requests",
        json!({ "my_slot_id": p.alice_slot, "their_slot_id": busy }),
        &p.alice.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(slots_of(&p.app, &p.alice).await[0]["status"], "SWAPPABLE");
}

#[tokio::test]
async fn second_proposal_for_locked_slot_conflicts() {
    let p = pair().await;
    propose(&p).await;

    let carol = common::signup(&p.app, "Carol").await;
    let carol_slot = create_slot(&p.app, &carol, "Lunch", 5, "SWAPPABLE").await;

    let response = post_json_auth(
        p.app.app(),
        "/api/v1/swap-requests",
        json!({ "my_slot_id": carol_slot, "their_slot_id": p.bob_slot }),
        &carol.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Respond
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accept_exchanges_ownership() {
    let p = pair().await;
    let swap_id = propose(&p).await["id"].as_i64().unwrap();

    let response = respond(&p.app, &p.bob, swap_id, true).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["message"], "Swap accepted");
    assert_eq!(json["data"]["swap"]["status"], "ACCEPTED");

    let alice_slots = slots_of(&p.app, &p.alice).await;
    assert_eq!(alice_slots.len(), 1);
    assert_eq!(alice_slots[0]["id"], p.bob_slot);
    assert_eq!(alice_slots[0]["status"], "BUSY");

    let bob_slots = slots_of(&p.app, &p.bob).await;
    assert_eq!(bob_slots[0]["id"], p.alice_slot);
    assert_eq!(bob_slots[0]["status"], "BUSY");
}

#[tokio::test]
async fn reject_releases_both_slots() {
    let p = pair().await;
    let swap_id = propose(&p).await["id"].as_i64().unwrap();

    let response = respond(&p.app, &p.bob, swap_id, false).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["message"], "Swap rejected");
    assert_eq!(json["data"]["swap"]["status"], "REJECTED");

    let alice_slots = slots_of(&p.app, &p.alice).await;
    assert_eq!(alice_slots[0]["id"], p.alice_slot);
    assert_eq!(alice_slots[0]["status"], "SWAPPABLE");
    assert_eq!(slots_of(&p.app, &p.bob).await[0]["status"], "SWAPPABLE");
}

#[tokio::test]
async fn only_target_may_respond_and_only_once() {
    let p = pair().await;
    let swap_id = propose(&p).await["id"].as_i64().unwrap();

    let response = respond(&p.app, &p.alice, swap_id, true).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = respond(&p.app, &p.bob, swap_id, false).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = respond(&p.app, &p.bob, swap_id, true).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn respond_requires_accept_flag() {
    let p = pair().await;
    let swap_id = propose(&p).await["id"].as_i64().unwrap();

    let response = post_json_auth(
        p.app.app(),
        &format!("/api/v1/swap-requests/{swap_id}/response"),
        json!({}),
        &p.bob.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn accept_after_slot_vanished_is_stale() {
    let p = pair().await;
    let swap_id = propose(&p).await["id"].as_i64().unwrap();

    let mut tx = p.app.state.store.begin().await.unwrap();
    tx.delete_slot(p.alice_slot).await.unwrap();
    tx.commit().await.unwrap();

    let response = respond(&p.app, &p.bob, swap_id, true).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "STALE_SWAP");
    assert_eq!(json["error"], "One of the slots no longer exists. Request canceled.");

    assert_eq!(slots_of(&p.app, &p.bob).await[0]["status"], "SWAPPABLE");
    let listing = body_json(get_auth(p.app.app(), "/api/v1/swap-requests", &p.bob.token).await).await;
    assert!(listing["data"]["incoming"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Cancellation through status change
// ---------------------------------------------------------------------------

#[tokio::test]
async fn owner_status_change_cancels_pending_swap() {
    let p = pair().await;
    propose(&p).await;

    let response = put_json_auth(
        p.app.app(),
        &format!("/api/v1/slots/{}", p.alice_slot),
        json!({ "status": "BUSY" }),
        &p.alice.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(slots_of(&p.app, &p.alice).await[0]["status"], "BUSY");
    assert_eq!(slots_of(&p.app, &p.bob).await[0]["status"], "SWAPPABLE");

    let listing = body_json(get_auth(p.app.app(), "/api/v1/swap-requests", &p.bob.token).await).await;
    assert!(listing["data"]["incoming"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn proposal_and_response_publish_notifications() {
    let p = pair().await;
    let mut rx = p.app.state.event_bus.subscribe();

    let swap_id = propose(&p).await["id"].as_i64().unwrap();
    let to_bob = rx.recv().await.unwrap();
    assert_eq!(to_bob.user_id, p.bob.id);
    assert_eq!(to_bob.event, "new_request");
    assert_eq!(to_bob.message, "You have a new swap request from Alice");

    respond(&p.app, &p.bob, swap_id, true).await;
    let to_alice = rx.recv().await.unwrap();
    assert_eq!(to_alice.user_id, p.alice.id);
    assert_eq!(to_alice.event, "request_response");
    assert_eq!(to_alice.message, "Your swap request was accepted");
}

#[tokio::test]
async fn cancellation_publishes_nothing() {
    let p = pair().await;
    propose(&p).await;
    let mut rx = p.app.state.event_bus.subscribe();

    put_json_auth(
        p.app.app(),
        &format!("/api/v1/slots/{}", p.bob_slot),
        json!({ "status": "SWAPPABLE" }),
        &p.bob.token,
    )
    .await;

    assert!(rx.try_recv().is_err());
}
