//! User-record store client: the generic merge-on-write engine.
//!
//! Every mutation runs the same read-merge-write cycle: GET the owning user
//! record, compute the replacement sub-collection through a pure merge rule
//! (see [`merge`]), PATCH the record with the new value, and surface the
//! outcome as a uniform [`Envelope`]. The remote record is the single source
//! of truth - no local copy is kept, and each operation re-fetches before it
//! writes, trading a double round-trip for freedom from stale-write races
//! within a tab.
//!
//! Cross-tab writers are handled by an optimistic version token: the PATCH
//! carries an `If-Match` precondition, and a 409/412 from the store surfaces
//! as a retryable conflict envelope instead of silently dropping the other
//! writer's change.

pub mod merge;

use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::IF_MATCH;
use tracing::instrument;

use tidepool_core::{EntryId, ProductId, UserId};

use crate::config::CommerceConfig;
use crate::error::StoreError;
use crate::models::{CartEntry, CheckoutEntry, CheckoutOutcome, FavouriteEntry, RecordPatch, UserRecord};
use crate::response::{Completed, Envelope};

use merge::EntryIdSeq;

/// Fetch failure message shared by every mutation.
const FETCH_USER_FAILED: &str = "Failed to fetch user data";

/// Client for the user-record store.
///
/// Cheaply cloneable; all public operations return an [`Envelope`] and never
/// a raw error.
#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<RecordStoreInner>,
}

struct RecordStoreInner {
    client: reqwest::Client,
    base_url: String,
    ids: EntryIdSeq,
}

impl RecordStore {
    /// Create a new record store client.
    #[must_use]
    pub fn new(config: &CommerceConfig) -> Self {
        Self {
            inner: Arc::new(RecordStoreInner {
                client: reqwest::Client::new(),
                base_url: config.user_api_url.clone(),
                ids: EntryIdSeq::new(),
            }),
        }
    }

    fn record_url(&self, user: &UserId) -> String {
        format!("{}/{}", self.inner.base_url, user)
    }

    // =========================================================================
    // Read-merge-write plumbing
    // =========================================================================

    /// GET the current user record.
    ///
    /// A non-success status becomes an application error carrying `failure`;
    /// the raw status is only logged.
    async fn fetch_record(&self, user: &UserId, failure: &str) -> Result<UserRecord, StoreError> {
        let response = self
            .inner
            .client
            .get(self.record_url(user))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, user = %user, "User record fetch returned non-success");
            return Err(StoreError::NotFound(failure.to_owned()));
        }

        // Read the body as text first for better parse diagnostics.
        let body = response.text().await?;
        match serde_json::from_str(&body) {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse user record"
                );
                Err(StoreError::Parse(e))
            }
        }
    }

    /// PATCH the user record with the newly computed sub-collection values.
    ///
    /// `expected_version` rides an `If-Match` precondition; stores that
    /// enforce it answer 409/412 when the record moved since the read.
    async fn write_patch(
        &self,
        user: &UserId,
        patch: RecordPatch,
        expected_version: u64,
        failure: &str,
    ) -> Result<UserRecord, StoreError> {
        let response = self
            .inner
            .client
            .patch(self.record_url(user))
            .header(IF_MATCH, expected_version.to_string())
            .json(&patch)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            tracing::warn!(user = %user, "User record write lost an optimistic-concurrency race");
            return Err(StoreError::Conflict);
        }
        if !status.is_success() {
            tracing::error!(%status, user = %user, "User record write returned non-success");
            return Err(StoreError::WriteFailed(failure.to_owned()));
        }

        let body = response.text().await?;
        match serde_json::from_str(&body) {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse updated user record"
                );
                Err(StoreError::Parse(e))
            }
        }
    }

    /// The generic read-merge-write cycle every mutation shares.
    ///
    /// Fetch completes before the merge rule runs, and the merge completes
    /// before the write; the returned record is the store's post-write
    /// authority, which callers replace their local view from.
    async fn mutate<F>(
        &self,
        user: &UserId,
        write_failure: &'static str,
        merge_rule: F,
    ) -> Result<UserRecord, StoreError>
    where
        F: FnOnce(&UserRecord) -> Result<RecordPatch, StoreError>,
    {
        let current = self.fetch_record(user, FETCH_USER_FAILED).await?;
        let patch = merge_rule(&current)?.with_version(current.version + 1);
        self.write_patch(user, patch, current.version, write_failure)
            .await
    }

    // =========================================================================
    // Cart Operations
    // =========================================================================

    /// Fetch the user's cart.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn cart_items(&self, user: &UserId) -> Envelope<Vec<CartEntry>> {
        Envelope::from_result(
            async {
                let record = self.fetch_record(user, "Failed to fetch cart items").await?;
                Ok(Completed::ok(record.cart, "Cart items fetched successfully"))
            }
            .await,
        )
    }

    /// Add one unit of a product to the cart.
    ///
    /// An existing line for the product gains quantity 1 (entry id
    /// preserved); otherwise a fresh line is appended.
    #[instrument(skip(self), fields(user = %user, product_id = %product_id))]
    pub async fn add_cart_item(&self, user: &UserId, product_id: ProductId) -> Envelope<Vec<CartEntry>> {
        Envelope::from_result(
            async {
                let record = self
                    .mutate(user, "Failed to add item to cart", |current| {
                        Ok(RecordPatch::cart(merge::add_cart_line(
                            &current.cart,
                            product_id,
                            &self.inner.ids,
                        )))
                    })
                    .await?;
                Ok(Completed::created(record.cart, "Item added to cart successfully"))
            }
            .await,
        )
    }

    /// Replace the quantity of one cart line.
    ///
    /// Quantity is validated at this boundary: zero fails with a 400-class
    /// envelope before any network round-trip.
    #[instrument(skip(self), fields(user = %user, entry_id = %entry_id))]
    pub async fn set_cart_quantity(
        &self,
        user: &UserId,
        entry_id: EntryId,
        quantity: u32,
    ) -> Envelope<Vec<CartEntry>> {
        Envelope::from_result(
            async {
                validate_quantity(quantity)?;
                let record = self
                    .mutate(user, "Failed to update cart item quantity", |current| {
                        Ok(RecordPatch::cart(merge::set_cart_quantity(
                            &current.cart,
                            entry_id,
                            quantity,
                        )))
                    })
                    .await?;
                Ok(Completed::ok(record.cart, "Cart item quantity updated successfully"))
            }
            .await,
        )
    }

    /// Remove one cart line. Removing an absent entry succeeds (no-op).
    #[instrument(skip(self), fields(user = %user, entry_id = %entry_id))]
    pub async fn remove_cart_item(&self, user: &UserId, entry_id: EntryId) -> Envelope<Vec<CartEntry>> {
        Envelope::from_result(
            async {
                let record = self
                    .mutate(user, "Failed to remove item from cart", |current| {
                        Ok(RecordPatch::cart(merge::remove_cart_line(&current.cart, entry_id)))
                    })
                    .await?;
                Ok(Completed::ok(record.cart, "Item removed from cart successfully"))
            }
            .await,
        )
    }

    /// Replace the cart with an empty collection.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn clear_cart(&self, user: &UserId) -> Envelope<Vec<CartEntry>> {
        Envelope::from_result(
            async {
                let record = self
                    .mutate(user, "Failed to clear cart", |_| Ok(RecordPatch::cart(Vec::new())))
                    .await?;
                Ok(Completed::ok(record.cart, "Cart cleared successfully"))
            }
            .await,
        )
    }

    // =========================================================================
    // Checkout Operations
    // =========================================================================

    /// Fetch the user's checkout history.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn checked_out_items(&self, user: &UserId) -> Envelope<Vec<CheckoutEntry>> {
        Envelope::from_result(
            async {
                let record = self
                    .fetch_record(user, "Failed to fetch checked out items")
                    .await?;
                Ok(Completed::ok(record.orders, "Checked out items fetched successfully"))
            }
            .await,
        )
    }

    /// Check out a batch of cart lines.
    ///
    /// Lines fold into the order history (accumulating quantity per product,
    /// refreshing `checked_out_at`) and the cart is cleared, both in a single
    /// combined patch so the two collections move atomically from the
    /// caller's perspective.
    #[instrument(skip(self, lines), fields(user = %user, line_count = lines.len()))]
    pub async fn checkout(&self, user: &UserId, lines: &[CartEntry]) -> Envelope<CheckoutOutcome> {
        Envelope::from_result(
            async {
                for line in lines {
                    validate_quantity(line.quantity)?;
                }

                let now = Utc::now();
                let record = self
                    .mutate(user, "Checkout failed", |current| {
                        Ok(RecordPatch::checkout(merge::merge_checkout(
                            &current.orders,
                            lines,
                            now,
                            &self.inner.ids,
                        )))
                    })
                    .await?;

                Ok(Completed::ok(
                    CheckoutOutcome {
                        orders: record.orders,
                        cart: record.cart,
                    },
                    "Checkout successful",
                ))
            }
            .await,
        )
    }

    /// Replace the quantity of one checkout-history entry.
    #[instrument(skip(self), fields(user = %user, entry_id = %entry_id))]
    pub async fn set_checkout_quantity(
        &self,
        user: &UserId,
        entry_id: EntryId,
        quantity: u32,
    ) -> Envelope<Vec<CheckoutEntry>> {
        Envelope::from_result(
            async {
                validate_quantity(quantity)?;
                let record = self
                    .mutate(user, "Failed to update checkout quantity", |current| {
                        Ok(RecordPatch::orders(merge::set_order_quantity(
                            &current.orders,
                            entry_id,
                            quantity,
                        )))
                    })
                    .await?;
                Ok(Completed::ok(record.orders, "Checked out quantity updated successfully"))
            }
            .await,
        )
    }

    /// Replace the checkout history with an empty collection.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn clear_checkout_history(&self, user: &UserId) -> Envelope<Vec<CheckoutEntry>> {
        Envelope::from_result(
            async {
                let record = self
                    .mutate(user, "Failed to clear checkout history", |_| {
                        Ok(RecordPatch::orders(Vec::new()))
                    })
                    .await?;
                Ok(Completed::ok(record.orders, "Checkout history cleared successfully"))
            }
            .await,
        )
    }

    /// Best-effort lookup of a single checkout entry; transport errors
    /// collapse to `None`.
    #[instrument(skip(self), fields(user = %user, entry_id = %entry_id))]
    pub async fn checkout_item(&self, user: &UserId, entry_id: EntryId) -> Option<CheckoutEntry> {
        let record = self.fetch_record(user, FETCH_USER_FAILED).await.ok()?;
        record.orders.into_iter().find(|entry| entry.id == entry_id)
    }

    // =========================================================================
    // Favourites Operations
    // =========================================================================

    /// Fetch the user's favourites.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn favourites(&self, user: &UserId) -> Envelope<Vec<FavouriteEntry>> {
        Envelope::from_result(
            async {
                let record = self.fetch_record(user, "Failed to fetch favourites").await?;
                Ok(Completed::ok(record.favourites, "Favourites fetched successfully"))
            }
            .await,
        )
    }

    /// Favourite a product. Favouriting is idempotent-rejecting: an existing
    /// favourite for the product fails with a 400-class envelope and leaves
    /// the collection unchanged.
    #[instrument(skip(self), fields(user = %user, product_id = %product_id))]
    pub async fn add_favourite(
        &self,
        user: &UserId,
        product_id: ProductId,
    ) -> Envelope<Vec<FavouriteEntry>> {
        Envelope::from_result(
            async {
                let now = Utc::now();
                let record = self
                    .mutate(user, "Failed to add to favourites", |current| {
                        merge::add_favourite(&current.favourites, product_id, now, &self.inner.ids)
                            .map(RecordPatch::favourites)
                    })
                    .await?;
                Ok(Completed::ok(record.favourites, "Added to favourites successfully"))
            }
            .await,
        )
    }

    /// Unfavourite a product, keyed by product id. Idempotent.
    #[instrument(skip(self), fields(user = %user, product_id = %product_id))]
    pub async fn remove_favourite(
        &self,
        user: &UserId,
        product_id: ProductId,
    ) -> Envelope<Vec<FavouriteEntry>> {
        Envelope::from_result(
            async {
                let record = self
                    .mutate(user, "Failed to remove from favourites", |current| {
                        Ok(RecordPatch::favourites(merge::remove_favourite(
                            &current.favourites,
                            product_id,
                        )))
                    })
                    .await?;
                Ok(Completed::ok(record.favourites, "Removed from favourites successfully"))
            }
            .await,
        )
    }

    /// Best-effort membership probe; any failure collapses to `false`.
    #[instrument(skip(self), fields(user = %user, product_id = %product_id))]
    pub async fn is_favourite(&self, user: &UserId, product_id: ProductId) -> bool {
        match self.fetch_record(user, FETCH_USER_FAILED).await {
            Ok(record) => record
                .favourites
                .iter()
                .any(|entry| entry.product_id == product_id),
            Err(_) => false,
        }
    }
}

/// Boundary validation shared by every quantity-bearing operation.
fn validate_quantity(quantity: u32) -> Result<(), StoreError> {
    if quantity == 0 {
        return Err(StoreError::InvalidInput(
            "Quantity must be at least 1".to_owned(),
        ));
    }
    Ok(())
}
