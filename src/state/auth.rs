//! Auth-session accessor for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by route guards and user-aware components to coordinate login redirects
//! and identity-dependent rendering. `loading` is the only signal a consumer
//! may use to show a transitional placeholder; `user == None` means logged out
//! only once `loading` is false.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;

use crate::net::types::User;
use crate::state::session::{SessionNotice, SessionStore};

/// Synchronous snapshot of the session: `{ user, loading }`.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    /// True while the store is still hydrating.
    pub loading: bool,
    pub notice: Option<SessionNotice>,
}

impl Default for AuthState {
    /// The boot state: still determining, never "logged out".
    fn default() -> Self {
        Self { user: None, loading: true, notice: None }
    }
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        !self.loading && self.user.is_some()
    }

    /// Settled and nobody is logged in.
    pub fn is_anonymous(&self) -> bool {
        !self.loading && self.user.is_none()
    }
}

/// Store handle plus a reactive mirror of its snapshots, shared via context.
#[derive(Clone, Debug)]
pub struct AuthContext {
    store: SessionStore,
    state: RwSignal<AuthState>,
}

impl AuthContext {
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Reactive accessor; re-runs dependents on every committed transition.
    pub fn state(&self) -> ReadSignal<AuthState> {
        self.state.read_only()
    }
}

/// Mirror `store` into a signal and provide it to the current component tree.
///
/// The subscription is dropped with the owning scope; the store itself keeps
/// running whether or not anyone is still listening.
pub fn provide_auth(store: SessionStore) -> AuthContext {
    let state = RwSignal::new(AuthState::default());
    let id = store.subscribe(move |snapshot| {
        // A disposed signal means the consumer unmounted; nothing to do.
        let _ = state.try_set(snapshot.clone());
    });
    state.set(store.snapshot());

    let cleanup_store = store.clone();
    on_cleanup(move || {
        cleanup_store.unsubscribe(id);
    });

    let ctx = AuthContext { store, state };
    provide_context(ctx.clone());
    ctx
}

/// Fetch the [`AuthContext`] provided by the app root.
pub fn use_auth() -> AuthContext {
    expect_context::<AuthContext>()
}
