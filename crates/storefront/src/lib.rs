//! Tidepool Storefront - client-side commerce state core.
//!
//! This library reconciles a user's cart, checkout history, and favourites
//! against a remote record-per-user document, keeps a derived
//! product-filter/pagination view synchronized with the address bar, and
//! enforces a client-side session-expiry lifecycle.
//!
//! # Architecture
//!
//! - [`records`] - generic merge-on-write engine over user-record
//!   sub-collections; every operation returns a uniform [`Envelope`]
//! - [`catalog`] - read-only catalogue client (moka-cached) plus the pure
//!   filter and the URL-synchronized paginator
//! - [`session`] - login/restore/expiry state machine over durable client
//!   storage, with a background expiry watchdog
//! - [`context`] - the explicit [`AppContext`] hosts construct instead of
//!   ambient global stores
//!
//! The remote user-record store is the single source of truth: mutations
//! re-fetch the record, merge, and write back a partial patch guarded by an
//! optimistic version token. Rendering, routing, and authentication are the
//! host's job.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod records;
pub mod response;
pub mod session;

pub use catalog::{CatalogClient, FilterError, FilterState, filter_products};
pub use config::{CommerceConfig, ConfigError};
pub use context::AppContext;
pub use error::StoreError;
pub use models::{CartEntry, CheckoutEntry, CheckoutOutcome, FavouriteEntry, Identity, UserRecord};
pub use records::RecordStore;
pub use response::Envelope;
pub use session::{
    RestoreOutcome, SessionEvent, SessionManager, SessionState, SessionWatchdog,
};
