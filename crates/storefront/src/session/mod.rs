//! Session lifecycle: login, restore, TTL expiry, and the background
//! watchdog.
//!
//! States move `Anonymous → Authenticated → (Expired | LoggedOut) →
//! Anonymous`. Identity and login timestamp live in durable client storage
//! (see [`store`]); expiry captures the current location so the login flow
//! can return the user where they were. Concurrent tabs are not coordinated -
//! each host runs its own watchdog against the shared storage and may
//! independently force-expire.

pub mod store;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore, SessionStoreError};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::instrument;
use uuid::Uuid;

use crate::config::CommerceConfig;
use crate::models::Identity;

/// Authentication state of the hosting session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No identity is established.
    Anonymous,
    /// An identity is established and within its TTL window.
    Authenticated {
        identity: Identity,
        login_at: DateTime<Utc>,
    },
}

impl SessionState {
    /// Whether an identity is established.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The established identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated { identity, .. } => Some(identity),
            Self::Anonymous => None,
        }
    }
}

/// Outcome of restoring persisted state on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A persisted identity was within its TTL and is now active.
    Restored(Identity),
    /// A persisted identity had outlived its TTL; storage was cleared and
    /// the current location captured for post-login redirect.
    Expired,
    /// Nothing usable was persisted.
    Anonymous,
}

/// Events emitted by the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session outlived its TTL; the host must notify the user and
    /// navigate to `redirect_to`.
    Expired {
        /// The login entry point.
        redirect_to: String,
    },
}

/// The session timeout state machine.
///
/// Cheaply cloneable; clones share state, storage, and the event channel.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
    poll_interval: Duration,
    login_path: String,
    state: Mutex<SessionState>,
    current_path: Mutex<String>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Create a session manager over the given durable storage.
    #[must_use]
    pub fn new(config: &CommerceConfig, store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(8);
        Self {
            inner: Arc::new(SessionManagerInner {
                store,
                ttl: config.session_ttl,
                poll_interval: config.session_poll_interval,
                login_path: config.login_path.clone(),
                state: Mutex::new(SessionState::Anonymous),
                current_path: Mutex::new("/".to_owned()),
                events,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_path(&self) -> MutexGuard<'_, String> {
        self.inner
            .current_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Record the host's current location, captured for post-login redirect
    /// when the session expires.
    pub fn note_location(&self, path: impl Into<String>) {
        *self.lock_path() = path.into();
    }

    /// Current authentication state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    /// Whether an identity is established.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock_state().is_authenticated()
    }

    /// The established identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.lock_state().identity().cloned()
    }

    /// Establish an identity: persist it with the current timestamp and
    /// enter `Authenticated`.
    ///
    /// # Errors
    ///
    /// Returns an error if durable storage rejects the write; state is left
    /// `Anonymous` in that case.
    #[instrument(skip(self, identity), fields(user = %identity.id))]
    pub fn login(&self, identity: Identity) -> Result<(), SessionStoreError> {
        let login_at = Utc::now();
        self.inner.store.set_identity(&identity)?;
        self.inner.store.set_login_time(login_at)?;

        let session_id = Uuid::new_v4();
        tracing::info!(%session_id, "Session established");

        *self.lock_state() = SessionState::Authenticated { identity, login_at };
        Ok(())
    }

    /// Drop the identity unconditionally: clear all persisted slots and
    /// enter `Anonymous`.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        self.inner.store.clear_all();
        *self.lock_state() = SessionState::Anonymous;
        tracing::info!("Session ended");
    }

    /// Restore persisted state on load.
    ///
    /// A persisted identity within its TTL becomes `Authenticated`; one that
    /// outlived the TTL captures the current location, clears the session
    /// slots, and lands `Anonymous`.
    #[instrument(skip(self))]
    pub fn restore(&self) -> RestoreOutcome {
        let (Some(identity), Some(login_at)) =
            (self.inner.store.identity(), self.inner.store.login_time())
        else {
            *self.lock_state() = SessionState::Anonymous;
            return RestoreOutcome::Anonymous;
        };

        if is_expired(login_at, Utc::now(), self.inner.ttl) {
            self.capture_redirect();
            self.inner.store.clear_session();
            *self.lock_state() = SessionState::Anonymous;
            tracing::info!(user = %identity.id, "Persisted session expired on load");
            return RestoreOutcome::Expired;
        }

        *self.lock_state() = SessionState::Authenticated {
            identity: identity.clone(),
            login_at,
        };
        RestoreOutcome::Restored(identity)
    }

    /// Take the redirect path captured at the last expiry, if any.
    #[must_use]
    pub fn take_redirect_path(&self) -> Option<String> {
        self.inner.store.take_redirect_path()
    }

    /// Spawn the background expiry watchdog.
    ///
    /// Polls the persisted login timestamp at the configured interval while
    /// the session is `Authenticated`; once the TTL elapses it captures the
    /// current location, clears the session slots, emits
    /// [`SessionEvent::Expired`], and stops. The watchdog also stops when
    /// the session leaves `Authenticated` for any other reason, and the
    /// returned guard aborts it when dropped.
    #[must_use]
    pub fn spawn_watchdog(&self) -> SessionWatchdog {
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(manager.inner.poll_interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The interval's first tick completes immediately; skip it so
            // expiry is only observed after a full poll interval.
            tick.tick().await;

            loop {
                tick.tick().await;

                if !manager.is_authenticated() {
                    break;
                }

                // Each tab reads the shared storage rather than its own
                // state, so whichever tab notices first wins.
                let Some(login_at) = manager.inner.store.login_time() else {
                    break;
                };

                if is_expired(login_at, Utc::now(), manager.inner.ttl) {
                    manager.expire();
                    break;
                }
            }
        });

        SessionWatchdog { handle }
    }

    /// Force-expire the session: capture location, clear storage, notify.
    fn expire(&self) {
        self.capture_redirect();
        self.inner.store.clear_session();
        *self.lock_state() = SessionState::Anonymous;
        tracing::info!("Session expired");

        let _ = self.inner.events.send(SessionEvent::Expired {
            redirect_to: self.inner.login_path.clone(),
        });
    }

    fn capture_redirect(&self) {
        let path = self.lock_path().clone();
        if let Err(e) = self.inner.store.set_redirect_path(&path) {
            tracing::warn!(error = %e, "Failed to capture redirect path");
        }
    }
}

/// Guard owning the watchdog task; dropping it cancels the poll.
pub struct SessionWatchdog {
    handle: JoinHandle<()>,
}

impl Drop for SessionWatchdog {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Whether a session that began at `login_at` has outlived `ttl` at `now`.
/// A login timestamp in the future (clock skew) counts as fresh.
fn is_expired(login_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    (now - login_at).to_std().is_ok_and(|elapsed| elapsed >= ttl)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use tidepool_core::UserId;

    use super::*;

    fn identity() -> Identity {
        Identity {
            id: UserId::parse("7").unwrap(),
            username: "marina".to_owned(),
        }
    }

    fn manager_with_ttl(ttl: Duration) -> (SessionManager, Arc<MemorySessionStore>) {
        let mut config = CommerceConfig::new(
            "http://localhost:4000/users",
            "http://localhost:4100/products",
        );
        config.session_ttl = ttl;
        config.session_poll_interval = Duration::from_millis(10);

        let store = Arc::new(MemorySessionStore::new());
        (SessionManager::new(&config, store.clone()), store)
    }

    #[test]
    fn test_is_expired() {
        let now: DateTime<Utc> = "2026-08-01T10:01:00Z".parse().unwrap();
        let ttl = Duration::from_secs(60);

        assert!(is_expired(now - TimeDelta::seconds(60), now, ttl));
        assert!(is_expired(now - TimeDelta::seconds(90), now, ttl));
        assert!(!is_expired(now - TimeDelta::seconds(59), now, ttl));
        // Future login timestamp counts as fresh.
        assert!(!is_expired(now + TimeDelta::seconds(5), now, ttl));
    }

    #[test]
    fn test_login_persists_and_authenticates() {
        let (manager, store) = manager_with_ttl(Duration::from_secs(60));

        manager.login(identity()).unwrap();

        assert!(manager.is_authenticated());
        assert_eq!(manager.identity().unwrap(), identity());
        assert_eq!(store.identity().unwrap(), identity());
        assert!(store.login_time().is_some());
    }

    #[test]
    fn test_logout_clears_every_slot() {
        let (manager, store) = manager_with_ttl(Duration::from_secs(60));
        manager.login(identity()).unwrap();
        store.set_redirect_path("/cart").unwrap();

        manager.logout();

        assert!(!manager.is_authenticated());
        assert!(store.identity().is_none());
        assert!(store.login_time().is_none());
        assert!(store.redirect_path().is_none());
    }

    #[test]
    fn test_restore_within_ttl() {
        let (manager, store) = manager_with_ttl(Duration::from_secs(60));
        store.set_identity(&identity()).unwrap();
        store
            .set_login_time(Utc::now() - TimeDelta::seconds(30))
            .unwrap();

        let outcome = manager.restore();

        assert_eq!(outcome, RestoreOutcome::Restored(identity()));
        assert!(manager.is_authenticated());
    }

    #[test]
    fn test_restore_after_ttl_expires_and_captures_redirect() {
        let (manager, store) = manager_with_ttl(Duration::from_secs(60));
        store.set_identity(&identity()).unwrap();
        store
            .set_login_time(Utc::now() - TimeDelta::seconds(120))
            .unwrap();
        manager.note_location("/products?page=2");

        let outcome = manager.restore();

        assert_eq!(outcome, RestoreOutcome::Expired);
        assert!(!manager.is_authenticated());
        assert!(store.identity().is_none());
        assert!(store.login_time().is_none());
        assert_eq!(
            manager.take_redirect_path().as_deref(),
            Some("/products?page=2")
        );
    }

    #[test]
    fn test_restore_with_nothing_persisted() {
        let (manager, _store) = manager_with_ttl(Duration::from_secs(60));
        assert_eq!(manager.restore(), RestoreOutcome::Anonymous);
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_watchdog_expires_session_and_notifies() {
        let (manager, store) = manager_with_ttl(Duration::ZERO);
        manager.login(identity()).unwrap();
        manager.note_location("/cart");

        let mut events = manager.subscribe();
        let _watchdog = manager.spawn_watchdog();

        let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("watchdog must fire within a second")
            .unwrap();

        assert_eq!(event, SessionEvent::Expired {
            redirect_to: "/login".to_owned(),
        });
        assert!(!manager.is_authenticated());
        assert!(store.identity().is_none());
        assert_eq!(store.take_redirect_path().as_deref(), Some("/cart"));
    }

    #[tokio::test]
    async fn test_watchdog_leaves_fresh_session_alone() {
        let (manager, _store) = manager_with_ttl(Duration::from_secs(3600));
        manager.login(identity()).unwrap();

        let _watchdog = manager.spawn_watchdog();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(manager.is_authenticated());
    }
}
