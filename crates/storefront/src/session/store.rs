//! Durable client-side session storage.
//!
//! The browser-local-storage analogue: three independent slots - identity
//! blob, login timestamp, and the redirect path captured at expiry - behind
//! a trait so hosts and tests can substitute their own backing. A corrupt
//! slot is treated as absent and cleared.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Identity;

/// Errors writing to durable session storage.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable storage for at most one identity at a time.
pub trait SessionStore: Send + Sync {
    /// The persisted identity, if present and intact.
    fn identity(&self) -> Option<Identity>;

    /// Persist the identity blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    fn set_identity(&self, identity: &Identity) -> Result<(), SessionStoreError>;

    /// The persisted login timestamp, if present and intact.
    fn login_time(&self) -> Option<DateTime<Utc>>;

    /// Persist the login timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp cannot be written.
    fn set_login_time(&self, at: DateTime<Utc>) -> Result<(), SessionStoreError>;

    /// The captured redirect path, if any, without consuming it.
    fn redirect_path(&self) -> Option<String>;

    /// Capture the path to return to after the next login.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be written.
    fn set_redirect_path(&self, path: &str) -> Result<(), SessionStoreError>;

    /// Consume the captured redirect path.
    fn take_redirect_path(&self) -> Option<String>;

    /// Clear the identity and login timestamp together, leaving a captured
    /// redirect path in place for the login flow to consume.
    fn clear_session(&self);

    /// Clear all three slots.
    fn clear_all(&self);
}

// =============================================================================
// File-backed store
// =============================================================================

const IDENTITY_FILE: &str = "identity.json";
const LOGIN_TIME_FILE: &str = "login_time";
const REDIRECT_FILE: &str = "redirect_path";

/// JSON-file-backed session storage under a configured directory.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open (creating if needed) the storage directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SessionStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn slot(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn read_slot(&self, name: &str) -> Option<String> {
        match fs::read_to_string(self.slot(name)) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(slot = name, error = %e, "Failed to read session slot");
                None
            }
        }
    }

    fn remove_slot(&self, name: &str) {
        if let Err(e) = fs::remove_file(self.slot(name))
            && e.kind() != ErrorKind::NotFound
        {
            tracing::warn!(slot = name, error = %e, "Failed to clear session slot");
        }
    }
}

impl SessionStore for FileSessionStore {
    fn identity(&self) -> Option<Identity> {
        let raw = self.read_slot(IDENTITY_FILE)?;
        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt persisted identity; clearing");
                self.remove_slot(IDENTITY_FILE);
                None
            }
        }
    }

    fn set_identity(&self, identity: &Identity) -> Result<(), SessionStoreError> {
        let blob = serde_json::to_string(identity)?;
        fs::write(self.slot(IDENTITY_FILE), blob)?;
        Ok(())
    }

    fn login_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.read_slot(LOGIN_TIME_FILE)?;
        match raw.trim().parse() {
            Ok(at) => Some(at),
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt persisted login time; clearing");
                self.remove_slot(LOGIN_TIME_FILE);
                None
            }
        }
    }

    fn set_login_time(&self, at: DateTime<Utc>) -> Result<(), SessionStoreError> {
        fs::write(self.slot(LOGIN_TIME_FILE), at.to_rfc3339())?;
        Ok(())
    }

    fn redirect_path(&self) -> Option<String> {
        self.read_slot(REDIRECT_FILE)
    }

    fn set_redirect_path(&self, path: &str) -> Result<(), SessionStoreError> {
        fs::write(self.slot(REDIRECT_FILE), path)?;
        Ok(())
    }

    fn take_redirect_path(&self) -> Option<String> {
        let path = self.read_slot(REDIRECT_FILE)?;
        self.remove_slot(REDIRECT_FILE);
        Some(path)
    }

    fn clear_session(&self) {
        self.remove_slot(IDENTITY_FILE);
        self.remove_slot(LOGIN_TIME_FILE);
    }

    fn clear_all(&self) {
        self.clear_session();
        self.remove_slot(REDIRECT_FILE);
    }
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Default)]
struct MemorySlots {
    identity: Option<Identity>,
    login_time: Option<DateTime<Utc>>,
    redirect_path: Option<String>,
}

/// In-memory session storage for tests and ephemeral hosts.
#[derive(Default)]
pub struct MemorySessionStore {
    slots: Mutex<MemorySlots>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySlots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn identity(&self) -> Option<Identity> {
        self.lock().identity.clone()
    }

    fn set_identity(&self, identity: &Identity) -> Result<(), SessionStoreError> {
        self.lock().identity = Some(identity.clone());
        Ok(())
    }

    fn login_time(&self) -> Option<DateTime<Utc>> {
        self.lock().login_time
    }

    fn set_login_time(&self, at: DateTime<Utc>) -> Result<(), SessionStoreError> {
        self.lock().login_time = Some(at);
        Ok(())
    }

    fn redirect_path(&self) -> Option<String> {
        self.lock().redirect_path.clone()
    }

    fn set_redirect_path(&self, path: &str) -> Result<(), SessionStoreError> {
        self.lock().redirect_path = Some(path.to_owned());
        Ok(())
    }

    fn take_redirect_path(&self) -> Option<String> {
        self.lock().redirect_path.take()
    }

    fn clear_session(&self) {
        let mut slots = self.lock();
        slots.identity = None;
        slots.login_time = None;
    }

    fn clear_all(&self) {
        *self.lock() = MemorySlots::default();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tidepool_core::UserId;

    use super::*;

    fn identity() -> Identity {
        Identity {
            id: UserId::parse("7").unwrap(),
            username: "marina".to_owned(),
        }
    }

    fn temp_store() -> (FileSessionStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("tidepool-session-{}", uuid::Uuid::new_v4()));
        (FileSessionStore::new(&dir).unwrap(), dir)
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        let at: DateTime<Utc> = "2026-08-01T10:00:00Z".parse().unwrap();

        store.set_identity(&identity()).unwrap();
        store.set_login_time(at).unwrap();
        store.set_redirect_path("/cart").unwrap();

        assert_eq!(store.identity().unwrap(), identity());
        assert_eq!(store.login_time().unwrap(), at);
        assert_eq!(store.redirect_path().as_deref(), Some("/cart"));
    }

    #[test]
    fn test_clear_session_keeps_redirect() {
        let store = MemorySessionStore::new();
        store.set_identity(&identity()).unwrap();
        store.set_login_time(Utc::now()).unwrap();
        store.set_redirect_path("/cart").unwrap();

        store.clear_session();

        assert!(store.identity().is_none());
        assert!(store.login_time().is_none());
        assert_eq!(store.take_redirect_path().as_deref(), Some("/cart"));
        assert!(store.take_redirect_path().is_none());
    }

    #[test]
    fn test_clear_all_clears_every_slot() {
        let store = MemorySessionStore::new();
        store.set_identity(&identity()).unwrap();
        store.set_login_time(Utc::now()).unwrap();
        store.set_redirect_path("/cart").unwrap();

        store.clear_all();

        assert!(store.identity().is_none());
        assert!(store.login_time().is_none());
        assert!(store.redirect_path().is_none());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let (store, dir) = temp_store();
        let at: DateTime<Utc> = "2026-08-01T10:00:00Z".parse().unwrap();

        store.set_identity(&identity()).unwrap();
        store.set_login_time(at).unwrap();
        store.set_redirect_path("/products?page=2").unwrap();

        assert_eq!(store.identity().unwrap(), identity());
        assert_eq!(store.login_time().unwrap(), at);
        assert_eq!(store.take_redirect_path().as_deref(), Some("/products?page=2"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_corrupt_identity_is_cleared() {
        let (store, dir) = temp_store();
        fs::write(dir.join(IDENTITY_FILE), "not json").unwrap();

        assert!(store.identity().is_none());
        assert!(!dir.join(IDENTITY_FILE).exists());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_absent_slots_are_none() {
        let (store, dir) = temp_store();

        assert!(store.identity().is_none());
        assert!(store.login_time().is_none());
        assert!(store.redirect_path().is_none());

        let _ = fs::remove_dir_all(dir);
    }
}
