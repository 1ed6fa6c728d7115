//! Route wrappers that gate their children on the session.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected route renders through one of these. The decision is
//! reactive: it is re-evaluated on each session change and each navigation,
//! never just once at mount.

use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::config::SessionConfig;
use crate::state::auth::use_auth;
use crate::util::auth::{AccessLevel, GuardDecision, decide, install_guard_redirect};

/// Shown while the session is still hydrating.
#[component]
pub fn LoadingPlaceholder() -> impl IntoView {
    view! {
        <div class="loading-placeholder" aria-busy="true">
            <span class="loading-placeholder__spinner"></span>
            "Loading..."
        </div>
    }
}

/// Render children for any logged-in user.
#[component]
pub fn RequireAuth(children: ChildrenFn) -> impl IntoView {
    guarded(AccessLevel::AnyUser, children)
}

/// Render children for admins; regular users are sent home.
#[component]
pub fn RequireAdmin(children: ChildrenFn) -> impl IntoView {
    guarded(AccessLevel::Admin, children)
}

fn guarded(level: AccessLevel, children: ChildrenFn) -> impl IntoView {
    let state = use_auth().state();
    let config = expect_context::<SessionConfig>();
    install_guard_redirect(state, level, config, use_navigate());

    move || match decide(&state.get(), level) {
        GuardDecision::Render => children(),
        GuardDecision::Loading => view! { <LoadingPlaceholder/> }.into_any(),
        // The redirect effect navigates; render nothing meanwhile.
        GuardDecision::Redirect(_) => ().into_any(),
    }
}
