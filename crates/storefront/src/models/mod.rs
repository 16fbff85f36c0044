//! Domain models for the commerce state core.

pub mod record;

pub use record::{
    CartEntry, CheckoutEntry, CheckoutOutcome, FavouriteEntry, Identity, RecordPatch, UserRecord,
};
