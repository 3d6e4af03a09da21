//! Session manager
//!
//! Owns the authentication state. The state is never stored directly; it is
//! derived from the token and cached user so that `Authenticated` without a
//! token cannot be represented:
//!
//! | token | user | state |
//! |---|---|---|
//! | none | none | `Unauthenticated` |
//! | some | none | `Resolving` |
//! | some | some | `Authenticated(user)` |
//!
//! Every asynchronous call captures a generation marker when it is issued
//! and its result is dropped if the session it belonged to is gone by the
//! time it resolves.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::events::SessionEvent;
use crate::domain::guard::DEFAULT_LOGIN_PATH;
use crate::domain::{
    AuthError, AuthPayload, AuthState, CredentialStore, DomainError, IdentityServiceClient,
    SessionError, SessionToken, User,
};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Behaviour knobs for the session manager
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Navigation target announced on logout and session expiry
    pub redirect_to: String,
    /// Keep the stored token when the current-user check fails with a
    /// network error, instead of treating it as a rejected token
    pub retain_on_network_failure: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            redirect_to: DEFAULT_LOGIN_PATH.to_string(),
            retain_on_network_failure: false,
        }
    }
}

/// Identifies the token a current-user check was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationMarker {
    epoch: u64,
    token: SessionToken,
}

impl GenerationMarker {
    pub fn token(&self) -> &SessionToken {
        &self.token
    }
}

/// What a current-user result did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// User cached, session authenticated
    Confirmed,
    /// Token cleared, session unauthenticated
    Invalidated,
    /// Transient failure; token kept, still resolving
    Retained,
    /// Result belonged to a session that no longer exists
    Discarded,
}

#[derive(Debug, Default)]
struct SessionInner {
    token: Option<SessionToken>,
    user: Option<User>,
    /// Bumped on every change of the stored token
    epoch: u64,
    /// Bumped on every explicit logout
    logouts: u64,
    /// Epoch of the outstanding current-user check, if any
    fetch_in_flight: Option<u64>,
}

impl SessionInner {
    fn state(&self) -> AuthState {
        match (&self.token, &self.user) {
            (None, _) => AuthState::Unauthenticated,
            (Some(_), None) => AuthState::Resolving,
            (Some(_), Some(user)) => AuthState::Authenticated(user.clone()),
        }
    }

    fn reset(&mut self) {
        self.token = None;
        self.user = None;
        self.epoch += 1;
        self.fetch_in_flight = None;
    }
}

/// Releases the in-flight claim of a current-user check that stops before
/// its result is reconciled (timeout wrapper, aborted task)
struct FetchClaim<'a> {
    manager: &'a SessionManager,
    epoch: u64,
    armed: bool,
}

impl FetchClaim<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for FetchClaim<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let mut inner = self.manager.inner();
        if inner.fetch_in_flight == Some(self.epoch) {
            tracing::debug!(epoch = self.epoch, "Current-user check cancelled");
            inner.fetch_in_flight = None;
        }
    }
}

/// Owner of the authentication state machine
///
/// Share it as `Arc<SessionManager>`. Observers read the state through
/// [`SessionManager::subscribe`] and react to [`SessionEvent`]s from
/// [`SessionManager::events`].
#[derive(Debug)]
pub struct SessionManager {
    identity: Arc<dyn IdentityServiceClient>,
    store: Arc<dyn CredentialStore>,
    options: SessionOptions,
    inner: Mutex<SessionInner>,
    state_tx: watch::Sender<AuthState>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(identity: Arc<dyn IdentityServiceClient>, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_options(identity, store, SessionOptions::default())
    }

    /// Build a manager whose initial state comes from the credential store:
    /// `Resolving` when a token is stored, `Unauthenticated` otherwise.
    pub fn with_options(
        identity: Arc<dyn IdentityServiceClient>,
        store: Arc<dyn CredentialStore>,
        options: SessionOptions,
    ) -> Self {
        let inner = SessionInner {
            token: store.get(),
            ..SessionInner::default()
        };
        let (state_tx, _) = watch::channel(inner.state());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::debug!(
            identity = identity.client_name(),
            store = store.store_name(),
            state = %inner.state(),
            "Session manager initialized"
        );

        Self {
            identity,
            store,
            options,
            inner: Mutex::new(inner),
            state_tx,
            events_tx,
        }
    }

    fn inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the state derived from `inner`. Called with the lock held so
    /// observers see transitions in the order they were applied.
    fn publish(&self, inner: &SessionInner) {
        self.state_tx.send_replace(inner.state());
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }

    // Observation

    pub fn state(&self) -> AuthState {
        self.inner().state()
    }

    /// Receiver that always holds the latest state
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner().user.clone()
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.inner().token.clone()
    }

    /// True while the stored token awaits confirmation
    pub fn is_resolving(&self) -> bool {
        self.state().is_transitional()
    }

    /// A user is already known for the stored token, so there is nothing to
    /// ask the identity service
    pub fn has_cached_user_for_current_token(&self) -> bool {
        let inner = self.inner();
        inner.token.is_some() && inner.user.is_some()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    // Current-user resolution

    /// Claim the right to check the stored token. Returns `None` when there
    /// is no token, a user is already cached for it, or a check for it is
    /// already in flight.
    pub fn begin_fetch(&self) -> Option<GenerationMarker> {
        let mut inner = self.inner();

        let token = inner.token.clone()?;
        if inner.user.is_some() || inner.fetch_in_flight == Some(inner.epoch) {
            return None;
        }

        inner.fetch_in_flight = Some(inner.epoch);
        Some(GenerationMarker {
            epoch: inner.epoch,
            token,
        })
    }

    /// Issue the current-user check in the background if one is needed.
    /// The check is claimed before this returns.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<Reconciliation>> {
        let marker = self.begin_fetch()?;
        let manager = Arc::clone(self);

        Some(tokio::spawn(async move { manager.resolve(marker).await }))
    }

    /// Run the current-user check inline if one is needed. Calling this again
    /// after the user is known does not reach the identity service.
    pub async fn refresh(&self) -> Option<Reconciliation> {
        let marker = self.begin_fetch()?;
        Some(self.resolve(marker).await)
    }

    async fn resolve(&self, marker: GenerationMarker) -> Reconciliation {
        let mut claim = FetchClaim {
            manager: self,
            epoch: marker.epoch,
            armed: true,
        };

        let result = self.identity.fetch_current_user(&marker.token).await;

        // Reconciliation releases the claim itself
        claim.disarm();
        self.reconcile_current_user(&marker, result)
    }

    /// Apply the result of a current-user check issued under `marker`
    pub fn reconcile_current_user(
        &self,
        marker: &GenerationMarker,
        result: Result<User, AuthError>,
    ) -> Reconciliation {
        let mut inner = self.inner();

        if inner.fetch_in_flight == Some(marker.epoch) {
            inner.fetch_in_flight = None;
        }

        let current = inner.epoch == marker.epoch && inner.token.as_ref() == Some(&marker.token);
        if !current || inner.user.is_some() {
            tracing::debug!(
                issued_epoch = marker.epoch,
                current_epoch = inner.epoch,
                "Discarding stale current-user result"
            );
            return Reconciliation::Discarded;
        }

        let result = result.and_then(|user| {
            if user.is_identified() {
                Ok(user)
            } else {
                Err(AuthError::token_invalid("Identity service returned a user without an id"))
            }
        });

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id(), "Session restored");
                inner.user = Some(user.clone());
                self.publish(&inner);
                self.emit(SessionEvent::Restored { user });
                Reconciliation::Confirmed
            }
            Err(error) if error.is_transient() && self.options.retain_on_network_failure => {
                tracing::warn!(error = %error, "Current-user check failed, keeping session token");
                Reconciliation::Retained
            }
            Err(error) => {
                tracing::warn!(kind = error.kind(), error = %error, "Session token rejected");
                self.discard_stored_token();
                inner.reset();
                self.publish(&inner);
                self.emit(SessionEvent::SessionExpired {
                    redirect_to: self.options.redirect_to.clone(),
                });
                Reconciliation::Invalidated
            }
        }
    }

    // Commands

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let logouts = self.inner().logouts;

        match self.identity.login(email, password).await {
            Ok(payload) => self.establish(payload, logouts, "login"),
            Err(error) => {
                tracing::info!(kind = error.kind(), error = %error, "Login rejected");
                Err(error)
            }
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let logouts = self.inner().logouts;

        match self.identity.register(name, email, password).await {
            Ok(payload) => self.establish(payload, logouts, "register"),
            Err(error) => {
                tracing::info!(kind = error.kind(), error = %error, "Registration rejected");
                Err(error)
            }
        }
    }

    /// Install a freshly issued session. Dropped if a logout happened after
    /// the request was issued; otherwise the latest result wins.
    fn establish(&self, payload: AuthPayload, logouts: u64, via: &str) -> Result<User, AuthError> {
        let mut inner = self.inner();

        if inner.logouts != logouts {
            tracing::debug!(via, "Discarding session issued before a logout");
            return Err(AuthError::Superseded);
        }

        if !payload.user.is_identified() {
            return Err(AuthError::unknown("Identity service returned a user without an id"));
        }

        self.store.set(&payload.token).map_err(|e| {
            tracing::error!(error = %e, "Failed to persist session token");
            AuthError::unknown(format!("Failed to persist session: {}", e))
        })?;

        let user = payload.user;
        inner.token = Some(payload.token);
        inner.user = Some(user.clone());
        inner.epoch += 1;
        inner.fetch_in_flight = None;
        self.publish(&inner);

        tracing::info!(via, user_id = %user.id(), "Signed in");
        self.emit(SessionEvent::SignedIn { user: user.clone() });

        Ok(user)
    }

    /// End the session from any state. The store and cached user are cleared
    /// before this returns; navigation is requested via
    /// [`SessionEvent::SignedOut`].
    ///
    /// The in-memory session ends even when the store cannot be cleared. The
    /// error is returned because the token would come back on the next start.
    pub fn logout(&self) -> Result<(), DomainError> {
        let mut inner = self.inner();

        let cleared = self.store.clear();
        inner.reset();
        inner.logouts += 1;
        self.publish(&inner);

        if let Err(e) = cleared {
            tracing::error!(store = self.store.store_name(), error = %e, "Failed to clear session token on logout");
            return Err(e);
        }

        tracing::info!("Signed out");
        self.emit(SessionEvent::SignedOut {
            redirect_to: self.options.redirect_to.clone(),
        });
        Ok(())
    }

    /// Clear a token that failed its check. A leftover token is checked
    /// again on the next start.
    fn discard_stored_token(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(store = self.store.store_name(), error = %e, "Failed to clear rejected session token");
        }
    }

    /// Edit the signed-in user's profile through the identity service
    ///
    /// A rejected token ends the session; any other failure leaves it as is.
    pub async fn update_profile(&self, name: &str, email: &str) -> Result<User, SessionError> {
        let (token, id, epoch) = {
            let inner = self.inner();
            match (&inner.token, &inner.user) {
                (Some(token), Some(user)) => (token.clone(), user.id().clone(), inner.epoch),
                _ => return Err(SessionError::NotAuthenticated),
            }
        };

        let result = self.identity.update_user(&token, &id, name, email).await;

        let mut inner = self.inner();
        if inner.epoch != epoch {
            return Err(AuthError::Superseded.into());
        }

        match result {
            Ok(user) => {
                self.replace_user(&mut inner, user.clone())?;
                Ok(user)
            }
            Err(error @ AuthError::TokenInvalid(_)) => {
                tracing::warn!(error = %error, "Session token rejected during profile update");
                self.discard_stored_token();
                inner.reset();
                self.publish(&inner);
                self.emit(SessionEvent::SessionExpired {
                    redirect_to: self.options.redirect_to.clone(),
                });
                Err(error.into())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Replace the cached user after a profile edit completed elsewhere
    pub fn apply_user_update(&self, user: User) -> Result<(), SessionError> {
        let mut inner = self.inner();

        if inner.token.is_none() || inner.user.is_none() {
            return Err(SessionError::NotAuthenticated);
        }

        self.replace_user(&mut inner, user)
    }

    fn replace_user(&self, inner: &mut SessionInner, user: User) -> Result<(), SessionError> {
        if !user.is_identified() {
            tracing::warn!("Ignoring profile update for a user without an id");
            return Err(AuthError::unknown("Identity service returned a user without an id").into());
        }

        inner.user = Some(user.clone());
        self.publish(inner);

        tracing::info!(user_id = %user.id(), "Profile updated");
        self.emit(SessionEvent::ProfileUpdated { user });
        Ok(())
    }
}
