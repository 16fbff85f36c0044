//! Integration tests for the favourites collection.

use tidepool_core::{ProductId, UserId};
use tidepool_integration_tests::{live_context, reset_test_user, test_user};

fn user() -> UserId {
    UserId::parse(&test_user()).expect("RECORD_STORE_TEST_USER must be a valid user id")
}

#[tokio::test]
#[ignore = "Requires a running record store"]
async fn test_duplicate_favourite_is_rejected() {
    let ctx = live_context();
    let records = ctx.records();
    let user = user();
    let product = ProductId::new(4);

    reset_test_user().await;

    let added = records.add_favourite(&user, product).await;
    assert!(added.status());
    let favourites = added.into_data().expect("success envelope carries favourites");
    assert!(favourites.iter().any(|f| f.product_id == product));

    let duplicate = records.add_favourite(&user, product).await;
    assert!(!duplicate.status());
    assert_eq!(duplicate.status_code(), 400);
    assert_eq!(duplicate.message(), "Already in favourites");

    // The collection is unchanged after the rejection.
    let current = records.favourites(&user).await.into_data().expect("fetch succeeds");
    assert_eq!(current, favourites);

    assert!(records.is_favourite(&user, product).await);
}

#[tokio::test]
#[ignore = "Requires a running record store"]
async fn test_remove_favourite_is_idempotent() {
    let ctx = live_context();
    let records = ctx.records();
    let user = user();
    let product = ProductId::new(4);

    records.add_favourite(&user, product).await;

    let removed = records.remove_favourite(&user, product).await;
    assert!(removed.status());
    assert!(!records.is_favourite(&user, product).await);

    let removed_again = records.remove_favourite(&user, product).await;
    assert!(removed_again.status());
}
