//! Integration tests for Tidepool.
//!
//! # Running Tests
//!
//! ```bash
//! # Start a record store serving /users (e.g. json-server on port 4000)
//! npx json-server --watch db.json --port 4000
//!
//! # Run the live tests
//! cargo test -p tidepool-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_flow` / `checkout_flow` / `favourites_flow` - live record-store
//!   flows, `#[ignore]`d unless a store is running
//! - `offline_failures` - envelope behavior against an unreachable store;
//!   runs everywhere
//!
//! The live tests read their target from `RECORD_STORE_URL` (default
//! `http://localhost:4000/users`) and mutate the user given by
//! `RECORD_STORE_TEST_USER` (default `1`), which must exist in the store.

use std::sync::Arc;

use tidepool_storefront::session::MemorySessionStore;
use tidepool_storefront::{AppContext, CommerceConfig};

/// Base URL for the user-record store (configurable via environment).
#[must_use]
pub fn record_store_url() -> String {
    std::env::var("RECORD_STORE_URL").unwrap_or_else(|_| "http://localhost:4000/users".to_string())
}

/// The seeded user the live tests mutate.
#[must_use]
pub fn test_user() -> String {
    std::env::var("RECORD_STORE_TEST_USER").unwrap_or_else(|_| "1".to_string())
}

/// Build a context against the configured live stores, with in-memory
/// session storage so tests never touch the filesystem.
#[must_use]
pub fn live_context() -> AppContext {
    init_tracing();
    let config = CommerceConfig::new(record_store_url(), "http://localhost:4100/products");
    AppContext::with_session_store(config, Arc::new(MemorySessionStore::new()))
}

/// Build a context whose stores are unreachable (nothing listens on the
/// discard port), for exercising failure envelopes offline.
#[must_use]
pub fn unreachable_context() -> AppContext {
    init_tracing();
    let config = CommerceConfig::new("http://127.0.0.1:9/users", "http://127.0.0.1:9/products");
    AppContext::with_session_store(config, Arc::new(MemorySessionStore::new()))
}

/// Reset the test user's collections to empty with a raw PATCH, bypassing
/// the client under test.
///
/// # Panics
///
/// Panics if the record store is unreachable; the live tests cannot proceed
/// without it.
pub async fn reset_test_user() {
    let url = format!("{}/{}", record_store_url(), test_user());
    let response = reqwest::Client::new()
        .patch(url)
        .json(&serde_json::json!({
            "cart": [],
            "orders": [],
            "favourites": [],
        }))
        .send()
        .await
        .expect("record store must be running for live tests");
    assert!(
        response.status().is_success(),
        "failed to reset test user: {}",
        response.status()
    );
}

/// Host-side tracing subscriber, initialized once per test binary.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidepool_storefront=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
