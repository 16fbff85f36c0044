//! Envelope behavior when the record store is unreachable.
//!
//! Nothing listens on the discard port, so these run without any live
//! server: transport failures must surface as masked 500 envelopes, and the
//! best-effort probes must collapse to their neutral values.

use tidepool_core::{EntryId, ProductId, UserId};
use tidepool_integration_tests::unreachable_context;

fn user() -> UserId {
    UserId::parse("42").expect("valid id")
}

#[tokio::test]
async fn test_transport_failure_is_masked_as_500() {
    let ctx = unreachable_context();

    let envelope = ctx.records().cart_items(&user()).await;

    assert!(!envelope.status());
    assert_eq!(envelope.status_code(), 500);
    assert_eq!(envelope.message(), "Something went wrong");
}

#[tokio::test]
async fn test_mutation_transport_failure_is_masked_as_500() {
    let ctx = unreachable_context();

    let envelope = ctx.records().add_cart_item(&user(), ProductId::new(7)).await;

    assert!(!envelope.status());
    assert_eq!(envelope.status_code(), 500);
    assert_eq!(envelope.message(), "Something went wrong");
}

#[tokio::test]
async fn test_best_effort_probes_collapse_to_neutral_values() {
    let ctx = unreachable_context();

    assert!(!ctx.records().is_favourite(&user(), ProductId::new(4)).await);
    assert!(
        ctx.records()
            .checkout_item(&user(), EntryId::new(9))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_catalogue_failure_surfaces_as_error() {
    let ctx = unreachable_context();

    assert!(ctx.catalog().products().await.is_err());
}
