//! Pure merge rules for user-record sub-collections.
//!
//! Each rule takes the current collection and returns the replacement value
//! the write-back will carry. Nothing here performs I/O, so every invariant
//! the mutator promises is unit-testable without a record store.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use tidepool_core::{EntryId, ProductId};

use crate::error::StoreError;
use crate::models::{CartEntry, CheckoutEntry, FavouriteEntry};

/// Monotonic entry-id generator.
///
/// Seeded from the millisecond epoch at construction and advanced with an
/// atomic increment, so ids are strictly increasing within a process and
/// land in the same numeric range as historical millisecond-epoch ids.
#[derive(Debug)]
pub struct EntryIdSeq(AtomicI64);

impl EntryIdSeq {
    /// Create a sequence seeded at the current millisecond epoch.
    #[must_use]
    pub fn new() -> Self {
        Self(AtomicI64::new(Utc::now().timestamp_millis()))
    }

    /// Create a sequence starting at an explicit seed.
    #[must_use]
    pub const fn starting_at(seed: i64) -> Self {
        Self(AtomicI64::new(seed))
    }

    /// Take the next id.
    pub fn next_id(&self) -> EntryId {
        EntryId::new(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for EntryIdSeq {
    fn default() -> Self {
        Self::new()
    }
}

/// Cart add rule: increment the quantity of an existing line for the product
/// (entry id preserved), or append a fresh line with quantity 1.
pub fn add_cart_line(cart: &[CartEntry], product_id: ProductId, ids: &EntryIdSeq) -> Vec<CartEntry> {
    let mut updated: Vec<CartEntry> = cart.to_vec();

    if let Some(existing) = updated.iter_mut().find(|e| e.product_id == product_id) {
        existing.quantity += 1;
    } else {
        updated.push(CartEntry {
            id: ids.next_id(),
            product_id,
            quantity: 1,
        });
    }

    updated
}

/// Quantity update rule: replace the quantity of the entry whose id matches,
/// leaving every other entry untouched. A missing id yields the collection
/// unchanged.
pub fn set_cart_quantity(cart: &[CartEntry], entry_id: EntryId, quantity: u32) -> Vec<CartEntry> {
    cart.iter()
        .map(|entry| {
            if entry.id == entry_id {
                CartEntry { quantity, ..entry.clone() }
            } else {
                entry.clone()
            }
        })
        .collect()
}

/// Quantity update rule for the order history.
pub fn set_order_quantity(
    orders: &[CheckoutEntry],
    entry_id: EntryId,
    quantity: u32,
) -> Vec<CheckoutEntry> {
    orders
        .iter()
        .map(|entry| {
            if entry.id == entry_id {
                CheckoutEntry { quantity, ..entry.clone() }
            } else {
                entry.clone()
            }
        })
        .collect()
}

/// Removal rule: filter out the entry whose id matches. Removal is
/// idempotent - a missing id is a no-op, not an error.
pub fn remove_cart_line(cart: &[CartEntry], entry_id: EntryId) -> Vec<CartEntry> {
    cart.iter().filter(|e| e.id != entry_id).cloned().collect()
}

/// Checkout batch rule: fold cart lines into the order history.
///
/// A line whose product already appears in the history accumulates quantity
/// on the existing entry (id preserved) and refreshes its `checked_out_at`;
/// anything else appends a new entry stamped `now`.
pub fn merge_checkout(
    orders: &[CheckoutEntry],
    lines: &[CartEntry],
    now: DateTime<Utc>,
    ids: &EntryIdSeq,
) -> Vec<CheckoutEntry> {
    let mut updated: Vec<CheckoutEntry> = orders.to_vec();

    for line in lines {
        if let Some(existing) = updated.iter_mut().find(|e| e.product_id == line.product_id) {
            existing.quantity += line.quantity;
            existing.checked_out_at = now;
        } else {
            updated.push(CheckoutEntry {
                id: ids.next_id(),
                product_id: line.product_id,
                quantity: line.quantity,
                checked_out_at: now,
            });
        }
    }

    updated
}

/// Favourite add rule: appending is idempotent-rejecting - an existing
/// product fails with a duplicate error and the collection is left alone.
///
/// # Errors
///
/// Returns [`StoreError::Duplicate`] when the product is already favourited.
pub fn add_favourite(
    favourites: &[FavouriteEntry],
    product_id: ProductId,
    now: DateTime<Utc>,
    ids: &EntryIdSeq,
) -> Result<Vec<FavouriteEntry>, StoreError> {
    if favourites.iter().any(|f| f.product_id == product_id) {
        return Err(StoreError::Duplicate("Already in favourites".to_owned()));
    }

    let mut updated: Vec<FavouriteEntry> = favourites.to_vec();
    updated.push(FavouriteEntry {
        id: ids.next_id(),
        product_id,
        added_at: now,
    });

    Ok(updated)
}

/// Favourite removal rule, keyed by product id (unique within favourites).
/// Idempotent like cart removal.
pub fn remove_favourite(favourites: &[FavouriteEntry], product_id: ProductId) -> Vec<FavouriteEntry> {
    favourites
        .iter()
        .filter(|f| f.product_id != product_id)
        .cloned()
        .collect()
}
