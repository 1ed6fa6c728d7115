//! Shared route-guard decisions.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route components must apply identical redirect behavior, so the decision
//! is a pure function of the accessor snapshot and the required access level.
//! It never errors: a missing user is anonymous and any non-admin role is
//! treated as regular.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

use crate::config::{RedirectTarget, SessionConfig};
use crate::net::types::Role;
use crate::state::auth::AuthState;

/// Access level a route requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessLevel {
    AnyUser,
    Admin,
}

/// What a guarded route should do for the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    /// Session still hydrating; show the placeholder, never the login screen.
    Loading,
    Redirect(RedirectTarget),
}

/// Decision table for a route requiring `level`.
pub fn decide(state: &AuthState, level: AccessLevel) -> GuardDecision {
    if state.loading {
        return GuardDecision::Loading;
    }
    let Some(user) = &state.user else {
        return GuardDecision::Redirect(RedirectTarget::Login);
    };
    match (level, user.role) {
        (AccessLevel::AnyUser, _) | (AccessLevel::Admin, Role::Admin) => GuardDecision::Render,
        (AccessLevel::Admin, Role::Regular) => GuardDecision::Redirect(RedirectTarget::Home),
    }
}

/// Navigate away whenever the session stops satisfying `level`.
///
/// Re-runs on every session change, so a logout elsewhere in the UI or a
/// role change takes effect without remounting the route.
pub fn install_guard_redirect<F>(auth: ReadSignal<AuthState>, level: AccessLevel, config: SessionConfig, navigate: F)
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    Effect::new(move || {
        if let GuardDecision::Redirect(target) = decide(&auth.get(), level) {
            navigate(config.route_for(target), NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });
}
