//! Email + password login page.
//!
//! SYSTEM CONTEXT
//! ==============
//! The only place `InvalidCredentials` is surfaced to the user. A successful
//! login commits the session and navigates to the home route; a session that
//! ended on a rejected token shows an expiry notice here.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::config::SessionConfig;
use crate::net::api::HttpGateway;
use crate::net::flows;
use crate::net::types::Credentials;
use crate::state::auth::use_auth;
use crate::state::session::SessionNotice;

/// Trim the form fields and require both.
fn validate_login_input(email: &str, password: &str) -> Result<Credentials, &'static str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err("Enter both email and password.");
    }
    Ok(Credentials { email: email.to_owned(), password: password.to_owned() })
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let state = auth.state();
    let config = expect_context::<SessionConfig>();
    let gateway = expect_context::<HttpGateway>();
    let navigate = use_navigate();

    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    // Already signed in: nothing to do here.
    let navigate_home = navigate.clone();
    let home_route = config.home_route.clone();
    Effect::new(move || {
        if state.get().is_authenticated() && !busy.get_untracked() {
            navigate_home(&home_route, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    let store = auth.store().clone();
    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let credentials = match validate_login_input(&email.get(), &password.get()) {
            Ok(c) => c,
            Err(msg) => {
                info.set(msg.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set("Signing in...".to_owned());

        let store = store.clone();
        let gateway = gateway.clone();
        let navigate = navigate.clone();
        let home_route = config.home_route.clone();
        leptos::task::spawn_local(async move {
            match flows::login(&store, &gateway, &credentials).await {
                Ok(_) => {
                    info.set(String::new());
                    navigate(&home_route, NavigateOptions::default());
                }
                Err(e) => info.set(e.user_message()),
            }
            busy.set(false);
        });
    };

    let expired = move || state.get().notice == Some(SessionNotice::Expired);

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"Welcome back"</h1>
                <Show when=expired>
                    <p class="login-message login-message--warning">
                        "Your session has expired. Please sign in again."
                    </p>
                </Show>
                <form class="login-form" on:submit=on_submit>
                    <input
                        class="login-input"
                        type="email"
                        placeholder="you@example.com"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        placeholder="Password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        "Login"
                    </button>
                </form>
                <Show when=move || !info.get().is_empty()>
                    <p class="login-message">{move || info.get()}</p>
                </Show>
                <p class="login-card__subtitle">
                    "New here? " <a href="/register">"Create an account"</a>
                </p>
            </div>
        </div>
    }
}
