//! Public landing page.

use leptos::prelude::*;

use crate::state::auth::use_auth;

#[component]
pub fn HomePage() -> impl IntoView {
    let state = use_auth().state();

    // Regular users go to matches, admins to the dashboard, visitors to sign-up.
    let call_to_action = move || {
        let snapshot = state.get();
        match snapshot.user {
            _ if snapshot.loading => ().into_any(),
            Some(user) if user.is_admin() => {
                view! { <a href="/admin" class="btn btn-secondary">"Go to Dashboard"</a> }.into_any()
            }
            Some(_) => view! { <a href="/matches" class="btn btn-primary">"View Matches"</a> }.into_any(),
            None => view! { <a href="/register" class="btn btn-primary">"Get Started"</a> }.into_any(),
        }
    };

    view! {
        <div class="home-page">
            <section class="hero">
                <h1>"Live Together, Smarter."</h1>
                <p>
                    "Match with roommates who fit your lifestyle, budget and habits."
                </p>
                <div class="hero__actions">{call_to_action}</div>
            </section>
            <section id="about" class="home-page__about">
                <h2>"Why ShareSpace?"</h2>
                <ul>
                    <li>"Verified profiles"</li>
                    <li>"Lifestyle matching"</li>
                    <li>"Community first"</li>
                </ul>
            </section>
        </div>
    }
}
