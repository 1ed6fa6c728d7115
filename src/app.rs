//! Root application component with routing and context providers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Composition root: builds the one session store, provides it (with the
//! config and gateway) through context, starts boot-time hydration in the
//! browser, and wraps each protected route in its guard.

use std::sync::Arc;

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};

use crate::components::guard::{RequireAdmin, RequireAuth};
use crate::components::navbar::Navbar;
use crate::config::SessionConfig;
use crate::net::api::HttpGateway;
use crate::pages::{
    admin::AdminPage, home::HomePage, login::LoginPage, matches::MatchesPage, profile::ProfilePage,
    profile_setup::ProfileSetupPage, register::RegisterPage,
};
use crate::state::auth::provide_auth;
use crate::state::session::SessionStore;
use crate::util::persistence::LocalTokenStorage;

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// The server render never hydrates the session, so it always emits the
/// loading placeholder for protected routes and the browser takes over from
/// the same state.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let config = SessionConfig::from_build_env_or_default();
    let gateway = HttpGateway::new(&config);
    let store = SessionStore::new(Arc::new(LocalTokenStorage::new(config.token_key.clone())));

    provide_auth(store.clone());
    provide_context(config);
    provide_context(gateway.clone());

    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(async move {
        crate::net::flows::initialize(&store, &gateway).await;
    });

    view! {
        <Stylesheet id="leptos" href="/pkg/sharespace.css"/>
        <Title text="ShareSpace"/>

        <Router>
            <Navbar/>
            <main class="app-main">
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=StaticSegment("") view=HomePage/>
                    <Route path=StaticSegment("login") view=LoginPage/>
                    <Route path=StaticSegment("register") view=RegisterPage/>
                    <Route
                        path=StaticSegment("setup")
                        view=|| view! { <RequireAuth><ProfileSetupPage/></RequireAuth> }
                    />
                    <Route
                        path=StaticSegment("matches")
                        view=|| view! { <RequireAuth><MatchesPage/></RequireAuth> }
                    />
                    <Route
                        path=StaticSegment("profile")
                        view=|| view! { <RequireAuth><ProfilePage/></RequireAuth> }
                    />
                    <Route
                        path=StaticSegment("admin")
                        view=|| view! { <RequireAdmin><AdminPage/></RequireAdmin> }
                    />
                </Routes>
            </main>
        </Router>
    }
}
