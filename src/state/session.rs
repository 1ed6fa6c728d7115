//! Process-wide session store: the single source of truth for who is logged in.
//!
//! SYSTEM CONTEXT
//! ==============
//! Built once in the composition root and handed to the Leptos tree through
//! `state::auth::provide_auth`. Pages, guards and network flows only reach the
//! session through this handle; nothing else writes the persisted token.
//!
//! STATE MACHINE
//! =============
//! `Hydrating -> {Authenticated, Anonymous}` at boot, then
//! `Authenticated <-> Anonymous`. Every committed transition bumps a
//! generation counter. Asynchronous work (the boot confirmation fetch, login
//! responses, authenticated calls) carries the generation it was issued
//! under and is discarded if the store has moved on, which makes the store a
//! last-writer-wins register in commit order.
//!
//! Credential-exchange responses are checked against a separate logout epoch
//! instead: only ending the session supersedes a login in flight, so a boot
//! confirmation or another login committing first never drops it.
//!
//! Mutations run under one lock and persist the token before the lock is
//! released; subscribers are notified afterwards with the committed snapshot.
//! If erasing the persisted token fails, the store is still `Anonymous` in
//! memory and the erase is retried on the next `logout`/`expire` until it
//! succeeds or a login overwrites the slot.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::net::api::{ApiError, AuthGateway};
use crate::net::types::{User, UserPatch};
use crate::state::auth::AuthState;
use crate::util::persistence::TokenStorage;

/// Hydration status of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// Boot-time reconciliation with persisted storage is still running.
    Hydrating,
    Authenticated,
    Anonymous,
}

/// One-shot message for the login screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionNotice {
    /// The previous session ended because the backend rejected its token.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("login requires a non-empty token")]
    EmptyToken,
    #[error("no authenticated session")]
    NotAuthenticated,
    #[error("session changed while the request was in flight")]
    Superseded,
}

/// Bearer token tagged with the generation that committed it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    generation: u64,
}

impl Credential {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("generation", &self.generation).finish_non_exhaustive()
    }
}

/// Outcome of starting hydration.
#[derive(Debug, PartialEq, Eq)]
pub enum Hydration {
    /// No confirmation fetch is needed; the store is already terminal (or
    /// another caller owns the pending fetch).
    Resolved(SessionStatus),
    /// A persisted token was found and must be confirmed via `/auth/me`.
    Pending(HydrationTicket),
}

/// Claim on the boot confirmation; stale once any transition commits.
#[derive(PartialEq, Eq)]
pub struct HydrationTicket {
    token: String,
    generation: u64,
}

impl HydrationTicket {
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for HydrationTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationTicket").field("generation", &self.generation).finish_non_exhaustive()
    }
}

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&AuthState) + Send + Sync>;

/// Session contents. User and token only exist together.
#[derive(Clone, Debug)]
enum Session {
    Hydrating,
    Authenticated { user: User, token: String },
    Anonymous,
}

impl Session {
    fn status(&self) -> SessionStatus {
        match self {
            Self::Hydrating => SessionStatus::Hydrating,
            Self::Authenticated { .. } => SessionStatus::Authenticated,
            Self::Anonymous => SessionStatus::Anonymous,
        }
    }
}

struct Inner {
    session: Session,
    generation: u64,
    /// Bumped only when a session ends.
    logouts: u64,
    /// Last erase of the persisted token failed.
    erase_pending: bool,
    notice: Option<SessionNotice>,
    hydration_started: bool,
    next_subscription: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl Inner {
    fn snapshot(&self) -> AuthState {
        let user = match &self.session {
            Session::Authenticated { user, .. } => Some(user.clone()),
            Session::Hydrating | Session::Anonymous => None,
        };
        AuthState { user, loading: matches!(self.session, Session::Hydrating), notice: self.notice }
    }

    fn commit(&mut self, session: Session) {
        self.session = session;
        self.generation += 1;
    }
}

/// Cloneable handle to the one session of this application instance.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
    storage: Arc<dyn TokenStorage>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionStore")
            .field("status", &inner.session.status())
            .field("generation", &inner.generation)
            .finish_non_exhaustive()
    }
}

/// Notifications collected under the lock and delivered after it is released.
struct Pending {
    snapshot: AuthState,
    subscribers: Vec<Subscriber>,
}

impl Pending {
    fn deliver(self) {
        for subscriber in self.subscribers {
            subscriber(&self.snapshot);
        }
    }
}

impl SessionStore {
    /// Create the store in `Hydrating`. Call [`Self::initialize`] once at boot.
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let inner = Inner {
            session: Session::Hydrating,
            generation: 0,
            logouts: 0,
            erase_pending: false,
            notice: None,
            hydration_started: false,
            next_subscription: 0,
            subscribers: Vec::new(),
        };
        Self { inner: Arc::new(Mutex::new(inner)), storage }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(inner: &Inner) -> Pending {
        Pending {
            snapshot: inner.snapshot(),
            subscribers: inner.subscribers.iter().map(|(_, s)| Arc::clone(s)).collect(),
        }
    }

    fn persist(&self, inner: &mut Inner, token: &str) {
        match self.storage.store(token) {
            Ok(()) => inner.erase_pending = false,
            Err(e) => leptos::logging::warn!("session: failed to persist token: {e}"),
        }
    }

    fn erase(&self, inner: &mut Inner) {
        inner.erase_pending = match self.storage.clear() {
            Ok(()) => false,
            Err(e) => {
                leptos::logging::warn!("session: failed to erase persisted token: {e}");
                true
            }
        };
    }

    // =============================================================
    // Accessor reads
    // =============================================================

    pub fn status(&self) -> SessionStatus {
        self.lock().session.status()
    }

    /// Committed `{ user, loading }` view of the session.
    pub fn snapshot(&self) -> AuthState {
        self.lock().snapshot()
    }

    pub fn user(&self) -> Option<User> {
        match &self.lock().session {
            Session::Authenticated { user, .. } => Some(user.clone()),
            Session::Hydrating | Session::Anonymous => None,
        }
    }

    /// Current token for an authenticated call, tagged for stale-response checks.
    pub fn credential(&self) -> Option<Credential> {
        let inner = self.lock();
        match &inner.session {
            Session::Authenticated { token, .. } => Some(Credential { token: token.clone(), generation: inner.generation }),
            Session::Hydrating | Session::Anonymous => None,
        }
    }

    /// Number of transitions committed so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Number of times a session has ended. Read before a credential
    /// exchange and pass to [`Self::login_if_current`].
    pub fn logout_epoch(&self) -> u64 {
        self.lock().logouts
    }

    // =============================================================
    // Hydration
    // =============================================================

    /// Reconcile persisted storage with the in-memory session.
    ///
    /// With no persisted token the store becomes `Anonymous` without touching
    /// the gateway. Otherwise it stays `Hydrating` until `/auth/me` answers,
    /// and any failure (including a gateway timeout) resolves to `Anonymous`.
    pub async fn initialize<G: AuthGateway>(&self, gateway: &G) -> SessionStatus {
        match self.begin_hydration() {
            Hydration::Resolved(status) => status,
            Hydration::Pending(ticket) => {
                let result = gateway.fetch_current_user(ticket.token()).await;
                self.complete_hydration(ticket, result).unwrap_or_else(|_| self.status())
            }
        }
    }

    /// First half of [`Self::initialize`]: read storage and decide whether a
    /// confirmation fetch is needed. Only the first call can return `Pending`.
    pub fn begin_hydration(&self) -> Hydration {
        let mut inner = self.lock();
        if inner.hydration_started || !matches!(inner.session, Session::Hydrating) {
            return Hydration::Resolved(inner.session.status());
        }
        inner.hydration_started = true;

        if let Some(token) = self.storage.load() {
            return Hydration::Pending(HydrationTicket { token, generation: inner.generation });
        }

        inner.commit(Session::Anonymous);
        leptos::logging::log!("session: no persisted token, anonymous");
        let pending = Self::pending(&inner);
        drop(inner);
        pending.deliver();
        Hydration::Resolved(SessionStatus::Anonymous)
    }

    /// Second half of [`Self::initialize`]: apply the confirmation result if
    /// the ticket is still current.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Superseded`] when a login or logout committed
    /// while the fetch was outstanding; the result is discarded.
    pub fn complete_hydration(
        &self,
        ticket: HydrationTicket,
        result: Result<User, ApiError>,
    ) -> Result<SessionStatus, SessionError> {
        let mut inner = self.lock();
        if inner.generation != ticket.generation || !matches!(inner.session, Session::Hydrating) {
            leptos::logging::log!("session: discarding stale confirmation (generation {})", ticket.generation);
            return Err(SessionError::Superseded);
        }

        match result {
            Ok(user) => {
                leptos::logging::log!("session: confirmed persisted token for user {}", user.id);
                inner.commit(Session::Authenticated { user, token: ticket.token });
            }
            Err(e) => {
                leptos::logging::warn!("session: confirmation failed ({e}), anonymous");
                self.erase(&mut inner);
                inner.commit(Session::Anonymous);
            }
        }
        let status = inner.session.status();
        let pending = Self::pending(&inner);
        drop(inner);
        pending.deliver();
        Ok(status)
    }

    // =============================================================
    // Transitions
    // =============================================================

    /// Commit a successful credential exchange.
    ///
    /// Replaces any current session in place and persists `token` in the same
    /// step. Makes no network call.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyToken`] for a blank token; state is untouched.
    pub fn login(&self, user: User, token: impl Into<String>) -> Result<(), SessionError> {
        self.login_inner(None, user, token.into())
    }

    /// Like [`Self::login`], but only if no logout or expiry committed since
    /// `issued_at` (the [`Self::logout_epoch`] read when the request was sent).
    ///
    /// Hydration results and other logins committing in the meantime do not
    /// block it; the later commit replaces the session.
    ///
    /// # Errors
    ///
    /// [`SessionError::Superseded`] for a stale response, or
    /// [`SessionError::EmptyToken`].
    pub fn login_if_current(&self, issued_at: u64, user: User, token: impl Into<String>) -> Result<(), SessionError> {
        self.login_inner(Some(issued_at), user, token.into())
    }

    fn login_inner(&self, issued_at: Option<u64>, user: User, token: String) -> Result<(), SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let mut inner = self.lock();
        if issued_at.is_some_and(|epoch| epoch != inner.logouts) {
            leptos::logging::log!("session: discarding login response issued before logout");
            return Err(SessionError::Superseded);
        }

        self.persist(&mut inner, &token);
        leptos::logging::log!("session: logged in as user {}", user.id);
        inner.commit(Session::Authenticated { user, token });
        inner.notice = None;
        let pending = Self::pending(&inner);
        drop(inner);
        pending.deliver();
        Ok(())
    }

    /// End the session and erase the persisted token. Returns `false` when
    /// already anonymous (no-op).
    ///
    /// Logging out while hydrating cancels the pending confirmation. While
    /// anonymous it only retries a previously failed erase.
    pub fn logout(&self) -> bool {
        self.end_session(None)
    }

    /// React to an `Unauthorized` response on a call made with `credential`.
    ///
    /// Ends the session with an expiry notice, unless the session that issued
    /// the call has already been replaced. Returns whether it logged out.
    pub fn expire(&self, credential: &Credential) -> bool {
        if self.lock().generation != credential.generation {
            leptos::logging::log!("session: ignoring 401 for superseded credential");
            return false;
        }
        self.end_session(Some(SessionNotice::Expired))
    }

    fn end_session(&self, notice: Option<SessionNotice>) -> bool {
        let mut inner = self.lock();
        if matches!(inner.session, Session::Anonymous) {
            if inner.erase_pending {
                self.erase(&mut inner);
            }
            return false;
        }

        self.erase(&mut inner);
        inner.commit(Session::Anonymous);
        inner.logouts += 1;
        inner.notice = notice;
        match notice {
            Some(SessionNotice::Expired) => leptos::logging::warn!("session: token rejected, logged out"),
            None => leptos::logging::log!("session: logged out"),
        }
        let pending = Self::pending(&inner);
        drop(inner);
        pending.deliver();
        true
    }

    /// Merge profile edits into the current user. Token and status are unchanged.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`] unless the session is authenticated.
    pub fn update_user(&self, patch: UserPatch) -> Result<User, SessionError> {
        self.update_user_inner(None, patch)
    }

    /// Like [`Self::update_user`], but only for the session that made the request.
    ///
    /// # Errors
    ///
    /// [`SessionError::Superseded`] if `credential` is stale, otherwise as
    /// [`Self::update_user`].
    pub fn update_user_for(&self, credential: &Credential, patch: UserPatch) -> Result<User, SessionError> {
        self.update_user_inner(Some(credential.generation), patch)
    }

    fn update_user_inner(&self, generation: Option<u64>, patch: UserPatch) -> Result<User, SessionError> {
        let mut inner = self.lock();
        if generation.is_some_and(|g| g != inner.generation) {
            return Err(SessionError::Superseded);
        }
        let Session::Authenticated { user, .. } = &mut inner.session else {
            return Err(SessionError::NotAuthenticated);
        };
        user.apply(patch);
        let updated = user.clone();
        let pending = Self::pending(&inner);
        drop(inner);
        pending.deliver();
        Ok(updated)
    }

    // =============================================================
    // Subscriptions
    // =============================================================

    /// Register `f` to receive every committed snapshot.
    ///
    /// Called after the store lock is released, so `f` may read the store.
    pub fn subscribe<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        inner.subscribers.push((id, Arc::new(f)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        inner.subscribers.len() != before
    }
}
