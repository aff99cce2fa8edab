//! Session lifecycle: the only writer of the session store and the only caller
//! that arms or cancels the refresh timer.
//!
//! Store and scheduler sit behind one mutex. The mutex is never held across a
//! network call, so `logout` can run while a refresh is in flight; each refresh
//! remembers the session generation it started in and drops its response if
//! the generation moved on. Identity changes are published before the mutex is
//! released, so subscribers see them in the order the store saw them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use desk_core::Identity;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::codec::{self, AccessToken};
use crate::error::AuthError;
use crate::scheduler::{self, RefreshScheduler, SchedulerState};
use crate::storage::SessionStorage;
use crate::store::SessionStore;
use crate::transport::{AuthTransport, Credentials, TokenGrant};

/// Header carrying the bearer token on authenticated calls.
pub const AUTH_HEADER: &str = "Authentication";

const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(2);
const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// How long before `exp` the refresh timer fires.
    pub refresh_margin: Duration,
    /// Shortest wait before the timer fires again after a refresh. Keeps
    /// tokens that live no longer than `refresh_margin` from refreshing in a
    /// tight loop.
    pub min_refresh_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            refresh_margin: DEFAULT_REFRESH_MARGIN,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        }
    }
}

struct SessionState {
    store: SessionStore,
    scheduler: RefreshScheduler,
    generation: u64,
}

struct Shared<T> {
    transport: T,
    options: SessionOptions,
    state: Mutex<SessionState>,
    identity_tx: watch::Sender<Option<Identity>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the process's session. Clones share the same state.
pub struct SessionManager<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for SessionManager<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: AuthTransport> SessionManager<T> {
    pub fn new(transport: T, storage: Arc<dyn SessionStorage>, options: SessionOptions) -> Self {
        let store = SessionStore::new(storage);
        let initial = store.get().map(|session| session.identity);
        let (identity_tx, _) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                transport,
                options,
                state: Mutex::new(SessionState {
                    store,
                    scheduler: RefreshScheduler::new(),
                    generation: 0,
                }),
                identity_tx,
            }),
        }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    /// # Errors
    ///
    /// Returns the transport's error (`Rejected` or `Network`) and leaves any
    /// existing session untouched, or `Storage` if the new session cannot be saved.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let credentials = Credentials::new(username, password);
        let grant = self
            .shared
            .transport
            .login(&credentials)
            .await
            .inspect_err(|error| tracing::info!(username, %error, "login failed"))?;
        self.establish(grant, "login")
    }

    /// # Errors
    ///
    /// Same as [`SessionManager::login`].
    pub async fn register(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let credentials = Credentials::new(username, password);
        let grant = self
            .shared
            .transport
            .register(&credentials)
            .await
            .inspect_err(|error| tracing::info!(username, %error, "registration failed"))?;
        self.establish(grant, "register")
    }

    /// Renew the session through the transport's refresh call, presenting the
    /// stored renewal cookie.
    ///
    /// A failed refresh ends the session. A response that arrives after the
    /// session changed (logout, new login, another refresh) is discarded
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns `Superseded` for discarded responses, otherwise the transport's
    /// error or `Storage`.
    pub async fn refresh(&self) -> Result<Identity, AuthError> {
        let (issued_for, renewal_cookie) = {
            let state = self.shared.lock();
            (state.generation, state.store.renewal_cookie())
        };
        let outcome = self
            .shared
            .transport
            .refresh(renewal_cookie.as_deref())
            .await;

        let mut state = self.shared.lock();
        if state.generation != issued_for {
            tracing::info!(
                issued_for,
                current = state.generation,
                "discarding stale refresh response"
            );
            return Err(AuthError::Superseded);
        }

        let stored = outcome.and_then(|grant| {
            state.store.put(
                &grant.identity,
                &grant.access_token,
                grant.renewal_cookie.as_deref(),
            )?;
            Ok(grant)
        });
        match stored {
            Ok(grant) => {
                state.generation += 1;
                self.arm_refresh(
                    &state,
                    &grant.access_token,
                    self.shared.options.min_refresh_interval,
                );
                self.notify(Some(grant.identity.clone()));
                drop(state);
                tracing::debug!(user = %grant.identity.username, "session refreshed");
                Ok(grant.identity)
            }
            Err(error) => {
                tracing::warn!(%error, "token refresh failed; ending session");
                if let Err(clear_error) = Self::end_session(&mut state) {
                    tracing::warn!(
                        error = %clear_error,
                        "failed to clear session after refresh failure"
                    );
                }
                self.notify(None);
                drop(state);
                Err(error)
            }
        }
    }

    /// Clear the session and stop the refresh timer. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the stored entries cannot be removed;
    /// the timer is stopped and in-flight refreshes are invalidated regardless.
    pub fn logout(&self) -> Result<(), AuthError> {
        let mut state = self.shared.lock();
        let cleared = Self::end_session(&mut state);
        self.notify(None);
        drop(state);
        tracing::info!("logged out");
        cleared
    }

    /// The current identity, only while its token is valid.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.shared.lock().store.get().map(|session| session.identity)
    }

    /// The last stored identity even if its token expired. Display only.
    #[must_use]
    pub fn last_identity(&self) -> Option<Identity> {
        self.shared.lock().store.identity()
    }

    /// The valid access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<AccessToken> {
        self.shared.lock().store.access_token()
    }

    /// `(AUTH_HEADER, "Bearer <token>")` while a valid token is present.
    #[must_use]
    pub fn bearer_header(&self) -> Option<(&'static str, String)> {
        self.access_token()
            .map(|token| (AUTH_HEADER, format!("Bearer {}", token.as_str())))
    }

    /// Start a background refresh when the token is missing or expired.
    ///
    /// Does not wait for it. Returns the spawned task for callers that want to.
    pub fn ensure_valid(&self) -> Option<JoinHandle<()>> {
        if self.access_token().is_some() {
            return None;
        }
        let manager = self.clone();
        Some(tokio::spawn(async move {
            match manager.refresh().await {
                Ok(identity) => tracing::debug!(user = %identity.username, "session renewed"),
                Err(error) => tracing::warn!(%error, "background refresh failed"),
            }
        }))
    }

    /// Pick up a session left by an earlier process and arm its refresh timer.
    pub fn resume(&self) -> Option<Identity> {
        let state = self.shared.lock();
        let session = state.store.get()?;
        self.arm_refresh(&state, &session.token, Duration::ZERO);
        self.notify(Some(session.identity.clone()));
        drop(state);
        Some(session.identity)
    }

    /// Observe identity changes. The current value is available immediately.
    ///
    /// Changes are published under the session lock: do not hold a borrow of
    /// the receiver while calling back into the manager.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.shared.identity_tx.subscribe()
    }

    #[must_use]
    pub fn scheduler_state(&self) -> SchedulerState {
        self.shared.lock().scheduler.state()
    }

    #[must_use]
    pub fn refresh_deadline(&self) -> Option<Instant> {
        self.shared.lock().scheduler.deadline()
    }

    /// Monotonic counter of session epochs.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.shared.lock().generation
    }

    fn establish(&self, grant: TokenGrant, origin: &'static str) -> Result<Identity, AuthError> {
        let mut state = self.shared.lock();
        // A new session never inherits the previous session's renewal cookie.
        let renewal_cookie = grant.renewal_cookie.as_deref().unwrap_or_default();
        state
            .store
            .put(&grant.identity, &grant.access_token, Some(renewal_cookie))?;
        state.generation += 1;
        self.arm_refresh(&state, &grant.access_token, Duration::ZERO);
        self.notify(Some(grant.identity.clone()));
        let generation = state.generation;
        drop(state);

        tracing::info!(
            origin,
            user = %grant.identity.username,
            generation,
            "session established"
        );
        Ok(grant.identity)
    }

    /// Arm the timer for `token`'s expiry, waiting at least `floor`.
    fn arm_refresh(&self, state: &SessionState, token: &AccessToken, floor: Duration) {
        let Some(expires_at) = codec::expiration_instant(token) else {
            state.scheduler.cancel();
            tracing::warn!("access token has no readable expiration; refresh timer not armed");
            return;
        };

        let due =
            scheduler::delay_until(expires_at, Utc::now(), self.shared.options.refresh_margin);
        let delay = due.max(floor);
        if delay > due {
            tracing::info!(
                %expires_at,
                wait_secs = delay.as_secs(),
                "token expires too soon; waiting the minimum refresh interval"
            );
        }
        let weak = Arc::downgrade(&self.shared);
        state.scheduler.arm(Instant::now() + delay, move || async move {
            let Some(shared) = weak.upgrade() else {
                return Ok(());
            };
            SessionManager { shared }.refresh().await.map(|_| ())
        });
        tracing::debug!(%expires_at, delay_secs = delay.as_secs(), "refresh timer armed");
    }

    fn end_session(state: &mut SessionState) -> Result<(), AuthError> {
        state.scheduler.cancel();
        state.generation += 1;
        state.store.clear()
    }

    fn notify(&self, identity: Option<Identity>) {
        self.shared.identity_tx.send_replace(identity);
    }
}
