//! Top navigation bar with role-aware links and logout.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::config::SessionConfig;
use crate::state::auth::use_auth;

#[component]
pub fn Navbar() -> impl IntoView {
    let auth = use_auth();
    let state = auth.state();
    let config = expect_context::<SessionConfig>();
    let navigate = use_navigate();

    let store = auth.store().clone();
    let login_route = config.login_route.clone();
    let on_logout = move |_| {
        store.logout();
        navigate(&login_route, NavigateOptions::default());
    };

    let display_name = move || state.get().user.map(|u| u.display_name().to_owned()).unwrap_or_default();
    let is_admin = move || state.get().user.is_some_and(|u| u.is_admin());
    let signed_out = move || !state.get().is_authenticated();

    view! {
        <nav class="navbar">
            <a href=config.home_route.clone() class="navbar__brand">"ShareSpace"</a>
            <span class="navbar__spacer"></span>
            <Show when=move || state.get().is_anonymous()>
                <a href="/login" class="navbar__link">"Login"</a>
                <a href="/register" class="navbar__link navbar__link--primary">"Register"</a>
            </Show>
            <Show when=move || state.get().is_authenticated()>
                <Show
                    when=is_admin
                    fallback=|| view! { <a href="/matches" class="navbar__link">"Matches"</a> }
                >
                    <a href="/admin" class="navbar__link">"Admin"</a>
                </Show>
                <a href="/profile" class="navbar__link">"Profile"</a>
                <span class="navbar__self">{display_name}</span>
            </Show>
            <button class="btn navbar__logout" hidden=signed_out on:click=on_logout>
                "Logout"
            </button>
        </nav>
    }
}
