//! Integration tests for the cart read-merge-write flow.
//!
//! These tests require a running record store (see the crate README in
//! `src/lib.rs`) seeded with the test user. Run with:
//! `cargo test -p tidepool-integration-tests -- --ignored`

use tidepool_core::{ProductId, UserId};
use tidepool_integration_tests::{live_context, reset_test_user, test_user};

fn user() -> UserId {
    UserId::parse(&test_user()).expect("RECORD_STORE_TEST_USER must be a valid user id")
}

#[tokio::test]
#[ignore = "Requires a running record store"]
async fn test_add_item_twice_accumulates_quantity() {
    let ctx = live_context();
    let records = ctx.records();
    let user = user();
    let product = ProductId::new(7);

    // Start from a clean record so assertions are exact.
    reset_test_user().await;

    let first = records.add_cart_item(&user, product).await;
    assert!(first.status());
    assert_eq!(first.status_code(), 201);

    let cart = first.into_data().expect("success envelope carries the cart");
    assert_eq!(cart.len(), 1);
    let line = cart.first().expect("one line");
    assert_eq!(line.quantity, 1);
    let line_id = line.id;

    let second = records.add_cart_item(&user, product).await;
    let cart = second.into_data().expect("success envelope carries the cart");

    // Same row, same id, quantity bumped - never a duplicate row.
    assert_eq!(cart.len(), 1);
    let line = cart.first().expect("one line");
    assert_eq!(line.id, line_id);
    assert_eq!(line.quantity, 2);
}

#[tokio::test]
#[ignore = "Requires a running record store"]
async fn test_update_remove_and_clear() {
    let ctx = live_context();
    let records = ctx.records();
    let user = user();

    reset_test_user().await;
    let cart = records
        .add_cart_item(&user, ProductId::new(5))
        .await
        .into_data()
        .expect("add succeeds");
    let line_id = cart.first().expect("one line").id;

    let updated = records.set_cart_quantity(&user, line_id, 4).await;
    assert_eq!(
        updated
            .into_data()
            .expect("update succeeds")
            .first()
            .expect("one line")
            .quantity,
        4
    );

    let removed = records.remove_cart_item(&user, line_id).await;
    assert!(removed.status());
    assert!(removed.into_data().expect("remove succeeds").is_empty());

    // Removing again is a no-op that still reports success.
    let removed_again = records.remove_cart_item(&user, line_id).await;
    assert!(removed_again.status());

    records.add_cart_item(&user, ProductId::new(6)).await;
    let cleared = records.clear_cart(&user).await;
    assert!(cleared.status());
    assert!(cleared.into_data().expect("clear succeeds").is_empty());
}

#[tokio::test]
#[ignore = "Requires a running record store"]
async fn test_unknown_user_fails_with_400() {
    let ctx = live_context();
    let user = UserId::parse(&format!("missing-{}", uuid::Uuid::new_v4())).expect("valid id");

    let envelope = ctx.records().cart_items(&user).await;

    assert!(!envelope.status());
    assert_eq!(envelope.status_code(), 400);
    assert_eq!(envelope.message(), "Failed to fetch cart items");
}
