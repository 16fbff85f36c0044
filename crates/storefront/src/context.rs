//! Application context shared across the hosting UI.
//!
//! The explicit replacement for ambient global stores: one context object
//! owns configuration, the record store client, the catalogue client, and
//! the session manager, constructed and torn down with the hosting session.

use std::sync::Arc;

use crate::catalog::CatalogClient;
use crate::config::CommerceConfig;
use crate::records::RecordStore;
use crate::session::{FileSessionStore, SessionManager, SessionStore, SessionStoreError};

/// Shared context for the commerce state core.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// clients and the session lifecycle.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<AppContextInner>,
}

struct AppContextInner {
    config: CommerceConfig,
    records: RecordStore,
    catalog: CatalogClient,
    session: SessionManager,
}

impl AppContext {
    /// Create a context with file-backed session storage under the
    /// configured session directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the session storage directory cannot be created.
    pub fn new(config: CommerceConfig) -> Result<Self, SessionStoreError> {
        let store = Arc::new(FileSessionStore::new(&config.session_dir)?);
        Ok(Self::with_session_store(config, store))
    }

    /// Create a context over caller-supplied session storage.
    #[must_use]
    pub fn with_session_store(config: CommerceConfig, store: Arc<dyn SessionStore>) -> Self {
        let records = RecordStore::new(&config);
        let catalog = CatalogClient::new(&config);
        let session = SessionManager::new(&config, store);

        Self {
            inner: Arc::new(AppContextInner {
                config,
                records,
                catalog,
                session,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &CommerceConfig {
        &self.inner.config
    }

    /// Get a reference to the user-record store client.
    #[must_use]
    pub fn records(&self) -> &RecordStore {
        &self.inner.records
    }

    /// Get a reference to the catalogue client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the session manager.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::session::MemorySessionStore;

    use super::*;

    #[test]
    fn test_context_is_cheaply_cloneable() {
        let config = CommerceConfig::new(
            "http://localhost:4000/users",
            "http://localhost:4100/products",
        );
        let context =
            AppContext::with_session_store(config, Arc::new(MemorySessionStore::new()));

        let clone = context.clone();
        assert_eq!(
            clone.config().user_api_url,
            context.config().user_api_url
        );
        assert!(!clone.session().is_authenticated());
    }
}
