//! Integration tests for the checkout batch merge.

use tidepool_core::{EntryId, ProductId, UserId};
use tidepool_integration_tests::{live_context, reset_test_user, test_user};
use tidepool_storefront::CartEntry;

fn user() -> UserId {
    UserId::parse(&test_user()).expect("RECORD_STORE_TEST_USER must be a valid user id")
}

#[tokio::test]
#[ignore = "Requires a running record store"]
async fn test_checkout_accumulates_and_clears_cart() {
    let ctx = live_context();
    let records = ctx.records();
    let user = user();
    let product = ProductId::new(5);

    reset_test_user().await;

    // First checkout establishes the history row.
    let first = records
        .checkout(&user, &[CartEntry {
            id: EntryId::new(1),
            product_id: product,
            quantity: 2,
        }])
        .await
        .into_data()
        .expect("checkout succeeds");
    assert_eq!(first.orders.len(), 1);
    let entry = first.orders.first().expect("one entry");
    assert_eq!(entry.quantity, 2);
    let (entry_id, t0) = (entry.id, entry.checked_out_at);

    // A second checkout of the same product accumulates on the same row and
    // refreshes the timestamp; the cart comes back empty.
    let second = records
        .checkout(&user, &[CartEntry {
            id: EntryId::new(2),
            product_id: product,
            quantity: 1,
        }])
        .await
        .into_data()
        .expect("checkout succeeds");

    assert_eq!(second.orders.len(), 1);
    let entry = second.orders.first().expect("one entry");
    assert_eq!(entry.id, entry_id);
    assert_eq!(entry.quantity, 3);
    assert!(entry.checked_out_at > t0);
    assert!(second.cart.is_empty());
}

#[tokio::test]
#[ignore = "Requires a running record store"]
async fn test_checkout_item_lookup() {
    let ctx = live_context();
    let records = ctx.records();
    let user = user();

    reset_test_user().await;
    let outcome = records
        .checkout(&user, &[CartEntry {
            id: EntryId::new(1),
            product_id: ProductId::new(8),
            quantity: 1,
        }])
        .await
        .into_data()
        .expect("checkout succeeds");
    let entry_id = outcome.orders.first().expect("one entry").id;

    let found = records.checkout_item(&user, entry_id).await;
    assert_eq!(found.expect("entry exists").id, entry_id);

    let missing = records.checkout_item(&user, EntryId::new(-1)).await;
    assert!(missing.is_none());

    let cleared = records.clear_checkout_history(&user).await;
    assert!(cleared.status());
    assert!(cleared.into_data().expect("clear succeeds").is_empty());
}
