//! Session manager: the single writer of session state.
//!
//! ```text
//! unknown ──restore──▶ logged_out ◀──sign_out / token cleared── logged_in
//!    │                     │                                       ▲
//!    └──────restore────────┴──────────────sign_in──────────────────┘
//! ```
//!
//! Every call that may change state takes a ticket from a monotonically
//! increasing epoch when it starts. A result is only published if no newer
//! call has started since, so a slow sign-in or restore can never overwrite
//! the outcome of a later one. Publishing and observer notification happen
//! under one lock, so observers see transitions in publish order and before
//! the publishing call returns.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use carelog_core::{Route, Session, SessionState};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::AuthError;
use crate::observers::{Observers, SubscriptionId};
use crate::store::{IdentityStore, UserRecordStore};
use crate::token::Token;

const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 60;

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedIn {
    pub session: Session,
    /// Where the UI should go next.
    pub navigate_to: Route,
}

/// State and the token backing it. A token is only ever held together with a
/// resolved session.
#[derive(Debug, Default)]
struct Current {
    state: SessionState,
    token: Option<Token>,
}

impl Current {
    const fn logged_in(session: Session, token: Token) -> Self {
        Self {
            state: SessionState::LoggedIn(session),
            token: Some(token),
        }
    }

    const fn logged_out() -> Self {
        Self {
            state: SessionState::LoggedOut,
            token: None,
        }
    }
}

/// Decrements the in-flight sign-in counter on drop.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct SessionManager {
    identity: Arc<dyn IdentityStore>,
    users: Arc<dyn UserRecordStore>,
    expiry_buffer_secs: i64,
    current: RwLock<Current>,
    publish_lock: Mutex<()>,
    epoch: AtomicU64,
    sign_ins: AtomicUsize,
    observers: Observers,
    last_error: Mutex<Option<AuthError>>,
}

impl SessionManager {
    /// Create a manager in the `Unknown` state. Call [`Self::restore`] next.
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityStore>, users: Arc<dyn UserRecordStore>) -> Self {
        Self {
            identity,
            users,
            expiry_buffer_secs: DEFAULT_EXPIRY_BUFFER_SECS,
            current: RwLock::new(Current::default()),
            publish_lock: Mutex::new(()),
            epoch: AtomicU64::new(0),
            sign_ins: AtomicUsize::new(0),
            observers: Observers::default(),
            last_error: Mutex::new(None),
        }
    }

    /// Treat tokens expiring within `secs` as absent.
    #[must_use]
    pub fn with_expiry_buffer(mut self, secs: i64) -> Self {
        self.expiry_buffer_secs = secs;
        self
    }

    // --- Readers ---

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.current.read().state.clone()
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.current.read().state.session().cloned()
    }

    /// True until restore completes and while a sign-in is in flight.
    #[must_use]
    pub fn pending(&self) -> bool {
        self.current.read().state.is_unknown() || self.sign_ins.load(Ordering::SeqCst) > 0
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current.read().state.is_admin()
    }

    /// Whether a token is currently held. Always equal to
    /// `state().is_logged_in()`.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.current.read().token.is_some()
    }

    /// Most recent failure, including ones that were not surfaced to the user
    /// (missing staff record on restore, failed remote revoke).
    #[must_use]
    pub fn last_error(&self) -> Option<AuthError> {
        self.last_error.lock().clone()
    }

    // --- Observers ---

    /// Register `callback` for every state transition. It runs synchronously,
    /// before the call that caused the transition returns.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // --- Operations ---

    /// Resolve the identity store's active token into a session.
    ///
    /// Never fails: a missing or expired token is the normal logged-out case,
    /// and store failures degrade to logged-out with the error recorded.
    pub async fn restore(&self) -> SessionState {
        let ticket = self.begin();

        let (next, error) = match self.resolve_active().await {
            Ok(Some((session, token))) => (Current::logged_in(session, token), None),
            Ok(None) => (Current::logged_out(), None),
            Err(error) => (Current::logged_out(), Some(error)),
        };

        if self.replace(ticket, next).is_some() {
            if let Some(error) = error {
                self.report(&error);
            }
        } else {
            tracing::debug!(ticket, "discarding superseded restore");
        }
        self.state()
    }

    /// Exchange credentials, resolve the staff record, and install the session.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` for blank input or rejected credentials.
    /// - `NetworkUnavailable` if either store cannot be reached.
    /// - `UserRecordMissing` if the account has no staff record.
    /// - `Superseded` if a newer call started before this one finished; the
    ///   result is discarded, the token it obtained is revoked, and state is
    ///   left to the newer call.
    pub async fn sign_in(&self, identifier: &str, secret: &str) -> Result<SignedIn, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || secret.is_empty() {
            let error = AuthError::InvalidCredentials;
            self.record(&error);
            return Err(error);
        }

        let ticket = self.begin();
        let _in_flight = InFlight::enter(&self.sign_ins);
        tracing::debug!(identifier, ticket, "signing in");

        let token = match self.identity.exchange_credentials(identifier, secret).await {
            Ok(token) => token,
            Err(store_error) => {
                let error = store_error.into_auth_error();
                return Err(self.fail_exchange(ticket, error));
            }
        };

        let session = match self.resolve(&token).await {
            Ok(session) => session,
            Err(error) => {
                // The new token has no usable session behind it.
                if let Err(revoke_error) = self.identity.invalidate(&token).await {
                    tracing::warn!(%revoke_error, "failed to revoke orphaned token");
                }
                let error = self.fail_resolve(ticket, error);
                if error == AuthError::Superseded {
                    self.reinstate_installed().await;
                }
                return Err(error);
            }
        };

        let installed = self.replace(ticket, Current::logged_in(session.clone(), token.clone()));
        let Some(previous) = installed else {
            tracing::debug!(identifier, ticket, "discarding superseded sign-in");
            self.discard_stale(&token).await;
            return Err(AuthError::Superseded);
        };

        *self.last_error.lock() = None;
        tracing::info!(
            subject_id = %session.subject_id,
            role = %session.role,
            "signed in"
        );

        // Switching accounts: the replaced session's token is no longer used.
        if let Some(previous) = previous
            && previous != token
        {
            self.revoke_replaced(&previous).await;
        }

        Ok(SignedIn {
            session,
            navigate_to: Route::HOME,
        })
    }

    /// Clear the session locally, then revoke the token remotely.
    ///
    /// Always ends logged out; a failed remote revoke is logged and recorded
    /// as `RevokeFailed` but never surfaced. Returns the entry route.
    pub async fn sign_out(&self) -> Route {
        let ticket = self.begin();
        let held = self.replace(ticket, Current::logged_out()).flatten();

        let token = match held {
            Some(token) => Some(token),
            None => match self.identity.active_token().await {
                Ok(token) => token,
                Err(error) => {
                    tracing::debug!(%error, "could not read active token during sign-out");
                    None
                }
            },
        };

        if let Some(token) = token {
            self.revoke_replaced(&token).await;
        }

        tracing::info!("signed out");
        Route::ENTRY
    }

    /// Apply a token change pushed by the identity store.
    ///
    /// The change is fully resolved (including the staff record lookup)
    /// before it is published.
    pub async fn apply_token_change(&self, change: Option<Token>) -> SessionState {
        let ticket = self.begin();

        let (next, error) = match change {
            None => {
                tracing::info!("identity store cleared the active token");
                (Current::logged_out(), None)
            }
            Some(token) if token.is_near_expiry(self.expiry_buffer_secs) => {
                tracing::info!(subject_id = %token.subject_id, "pushed token is expired");
                (Current::logged_out(), None)
            }
            Some(token) => match self.resolve(&token).await {
                Ok(session) => (Current::logged_in(session, token), None),
                Err(error) => (Current::logged_out(), Some(error)),
            },
        };

        if self.replace(ticket, next).is_some() {
            if let Some(error) = error {
                self.report(&error);
            }
        } else {
            tracing::debug!(ticket, "discarding superseded token change");
        }
        self.state()
    }

    /// Drain identity store notifications on a background task, one at a
    /// time and in arrival order.
    ///
    /// The task holds only a weak reference and exits when the manager is
    /// dropped or the store closes its channel.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.identity.subscribe();
        let manager: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        let Some(manager) = manager.upgrade() else {
                            break;
                        };
                        manager.apply_token_change(change).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "missed identity store notifications; re-syncing");
                        let Some(manager) = manager.upgrade() else {
                            break;
                        };
                        manager.restore().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    // --- Internals ---

    fn begin(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install `next` if `ticket` is still the newest call, then notify
    /// observers. Returns the previously held token (`Some(None)` if there
    /// was none), or `None` if the ticket was stale.
    fn replace(&self, ticket: u64, next: Current) -> Option<Option<Token>> {
        let _publishing = self.publish_lock.lock();
        if self.epoch.load(Ordering::SeqCst) != ticket {
            return None;
        }

        let (changed, previous_token, published) = {
            let mut current = self.current.write();
            debug_assert!(
                current
                    .state
                    .status()
                    .can_transition_to(next.state.status())
            );
            let changed = current.state != next.state;
            let previous = std::mem::replace(&mut *current, next);
            (changed, previous.token, current.state.clone())
        };

        if changed {
            tracing::debug!(status = %published.status(), "session state changed");
            self.observers.notify(&published);
        }
        Some(previous_token)
    }

    async fn resolve_active(&self) -> Result<Option<(Session, Token)>, AuthError> {
        let token = match self.identity.active_token().await {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(None),
            Err(error) => return Err(error.into_auth_error()),
        };

        if token.is_near_expiry(self.expiry_buffer_secs) {
            tracing::info!(
                subject_id = %token.subject_id,
                expires_at = ?token.expires_at,
                "stored token is expired; treating as logged out"
            );
            return Ok(None);
        }

        let session = self.resolve(&token).await?;
        Ok(Some((session, token)))
    }

    async fn resolve(&self, token: &Token) -> Result<Session, AuthError> {
        match self.users.find_for_token(token).await {
            Ok(Some(record)) => Ok(Session::from_record(&record, Utc::now())),
            Ok(None) => Err(AuthError::UserRecordMissing {
                subject_id: token.subject_id.clone(),
            }),
            Err(error) => Err(error.into_auth_error()),
        }
    }

    /// Credential exchange failed: state is kept, except that an unresolved
    /// `Unknown` settles to logged out.
    fn fail_exchange(&self, ticket: u64, error: AuthError) -> AuthError {
        if self.epoch.load(Ordering::SeqCst) != ticket {
            return AuthError::Superseded;
        }
        if self.current.read().state.is_unknown() {
            let _ = self.replace(ticket, Current::logged_out());
        }
        self.report(&error);
        error
    }

    /// Staff record resolution failed after a token was issued: the session
    /// is cleared so no token is ever held without a resolved role.
    fn fail_resolve(&self, ticket: u64, error: AuthError) -> AuthError {
        if self.replace(ticket, Current::logged_out()).is_none() {
            return AuthError::Superseded;
        }
        self.report(&error);
        error
    }

    /// Revoke a token this client no longer uses. Failures are recorded as
    /// `RevokeFailed` and never surfaced.
    async fn revoke_replaced(&self, token: &Token) {
        if let Err(store_error) = self.identity.invalidate(token).await {
            let error = AuthError::RevokeFailed(store_error.to_string());
            tracing::warn!(%error, "remote revoke failed; dropped locally");
            self.record(&error);
        }
    }

    /// A superseded sign-in still obtained a token, and the exchange made it
    /// the store's active one. Revoke it, unless a newer restore adopted the
    /// very same token, and hand the store back the installed session's token.
    async fn discard_stale(&self, token: &Token) {
        if self.current.read().token.as_ref() == Some(token) {
            return;
        }
        if let Err(error) = self.identity.invalidate(token).await {
            tracing::warn!(%error, "failed to revoke superseded token");
        }
        self.reinstate_installed().await;
    }

    async fn reinstate_installed(&self) {
        let installed = self.current.read().token.clone();
        if let Some(installed) = installed
            && let Err(error) = self.identity.reinstate(&installed).await
        {
            tracing::warn!(%error, "failed to reinstate the active token");
        }
    }

    fn report(&self, error: &AuthError) {
        match error {
            AuthError::UserRecordMissing { subject_id } => {
                tracing::error!(%subject_id, "token is valid but no staff record matches it");
            }
            other => tracing::warn!(error = %other, "authentication failed"),
        }
        self.record(error);
    }

    fn record(&self, error: &AuthError) {
        *self.last_error.lock() = Some(error.clone());
    }
}
