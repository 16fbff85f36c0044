//! The user record and its owned sub-collections.
//!
//! A user record is the server-held document describing one identity's cart,
//! order history, and favourites. Field names follow the remote document's
//! camelCase convention; unknown remote fields are ignored on deserialize so
//! the client keeps working when the store grows new fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tidepool_core::{EntryId, ProductId, UserId};

/// One line in a user's cart.
///
/// `product_id` is a foreign key into the catalogue and is unique within the
/// cart - repeat additions increment `quantity` instead of appending rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    /// Entry identity, assigned at creation time and stable across quantity
    /// updates.
    pub id: EntryId,
    /// Catalogue product this line refers to.
    pub product_id: ProductId,
    /// Units of the product; at least 1.
    pub quantity: u32,
}

/// One line in a user's checkout (order) history.
///
/// At most one entry per `product_id`: repeated checkouts of the same product
/// accumulate quantity and refresh `checked_out_at` rather than duplicating
/// rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutEntry {
    pub id: EntryId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// When this product was last checked out.
    pub checked_out_at: DateTime<Utc>,
}

/// One favourited product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteEntry {
    pub id: EntryId,
    /// Unique within the favourites collection.
    pub product_id: ProductId,
    pub added_at: DateTime<Utc>,
}

/// The server-held document for one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub cart: Vec<CartEntry>,
    #[serde(default)]
    pub orders: Vec<CheckoutEntry>,
    #[serde(default)]
    pub favourites: Vec<FavouriteEntry>,
    /// Optimistic concurrency token; 0 for stores that do not supply one.
    #[serde(default)]
    pub version: u64,
}

/// A partial write-back body for `PATCH /users/{id}`.
///
/// Only the sub-collections a mutation touched are serialized, so the store
/// merges the rest of the record untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<Vec<CartEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders: Option<Vec<CheckoutEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favourites: Option<Vec<FavouriteEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl RecordPatch {
    /// Patch replacing the cart collection.
    #[must_use]
    pub fn cart(entries: Vec<CartEntry>) -> Self {
        Self {
            cart: Some(entries),
            ..Self::default()
        }
    }

    /// Patch replacing the orders collection.
    #[must_use]
    pub fn orders(entries: Vec<CheckoutEntry>) -> Self {
        Self {
            orders: Some(entries),
            ..Self::default()
        }
    }

    /// Patch replacing the favourites collection.
    #[must_use]
    pub fn favourites(entries: Vec<FavouriteEntry>) -> Self {
        Self {
            favourites: Some(entries),
            ..Self::default()
        }
    }

    /// Combined checkout patch: new order history plus an emptied cart, as a
    /// single write.
    #[must_use]
    pub fn checkout(orders: Vec<CheckoutEntry>) -> Self {
        Self {
            orders: Some(orders),
            cart: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Stamp the version the write advances the record to.
    #[must_use]
    pub const fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }
}

/// Result of a checkout: both collections the combined patch replaced, as the
/// store now holds them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOutcome {
    /// The post-write order history.
    pub orders: Vec<CheckoutEntry>,
    /// The post-write cart (empty after a successful checkout).
    pub cart: Vec<CartEntry>,
}

/// The minimal persisted identity for an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub username: String,
}
