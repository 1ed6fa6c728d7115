//! Roommate suggestions for the logged-in user.
//!
//! Matching needs a location, so the fetch only runs once the profile is
//! complete; otherwise the page points back to profile setup.

use leptos::prelude::*;

use crate::net::api::HttpGateway;
use crate::net::flows;
use crate::net::types::User;
use crate::state::auth::use_auth;

/// Card for one suggested roommate.
#[component]
pub fn MatchCard(user: User, image_url: Option<String>) -> impl IntoView {
    let initial = user.display_name().chars().next().map_or_else(|| "?".to_owned(), |c| c.to_string());
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_owned());
    let has_apartment = user.has_apartment.as_deref() == Some("yes");
    let looking = user.is_looking_for_roommate.as_deref() == Some("yes");

    view! {
        <div class="match-card">
            <div class="match-card__header">
                {match image_url {
                    Some(src) => view! { <img class="match-card__avatar" src=src alt=user.name.clone()/> }.into_any(),
                    None => view! { <div class="match-card__avatar match-card__avatar--empty">{initial}</div> }.into_any(),
                }}
                <div>
                    <h2 class="match-card__name">{user.display_name().to_owned()}</h2>
                    <span class="badge">{show(&user.gender)}</span>
                </div>
            </div>
            <div class="match-card__flags">
                <Show when=move || has_apartment>
                    <span class="badge badge--secondary">"Has apartment"</span>
                </Show>
                <Show when=move || looking>
                    <span class="badge badge--outline">"Looking"</span>
                </Show>
            </div>
            <ul class="match-card__stats">
                <li>{show(&user.location)}</li>
                <li>"Budget: " {show(&user.budget)}</li>
                <li>{show(&user.smoking)} " / " {show(&user.cleanliness)}</li>
                <li>{show(&user.food_preference)} " / " {show(&user.sleep_schedule)}</li>
            </ul>
            <p class="match-card__bio">{user.bio.clone().unwrap_or_else(|| "No bio provided.".to_owned())}</p>
        </div>
    }
}

#[component]
pub fn MatchesPage() -> impl IntoView {
    let auth = use_auth();
    let state = auth.state();
    let gateway = expect_context::<HttpGateway>();
    let uploads = gateway.clone();

    let matches = RwSignal::new(None::<Result<Vec<User>, String>>);
    let requested = RwSignal::new(false);

    let store = auth.store().clone();
    Effect::new(move || {
        let ready = state.get().user.is_some_and(|u| u.has_complete_profile());
        if !ready || requested.get_untracked() {
            return;
        }
        requested.set(true);
        let store = store.clone();
        let gateway = gateway.clone();
        leptos::task::spawn_local(async move {
            let result = flows::fetch_matches(&store, &gateway).await.map_err(|e| e.user_message());
            matches.set(Some(result));
        });
    });

    let profile_ready = move || state.get().user.is_some_and(|u| u.has_complete_profile());
    let location = move || state.get().user.and_then(|u| u.location).unwrap_or_default();

    let results = move || match matches.get() {
        None => view! { <div class="loading-placeholder">"Finding matches..."</div> }.into_any(),
        Some(Err(msg)) => view! { <p class="form-message">{msg}</p> }.into_any(),
        Some(Ok(list)) if list.is_empty() => view! {
            <div class="matches-page__empty">
                <h2>"No matches found"</h2>
                <p>"We couldn't find anyone in " {location} " right now."</p>
            </div>
        }
        .into_any(),
        Some(Ok(list)) => {
            let uploads = uploads.clone();
            list.into_iter()
                .map(|user| {
                    let image_url = user.profile_image.as_ref().map(|img| uploads.url(&format!("/uploads/{img}")));
                    view! { <MatchCard user=user image_url=image_url/> }
                })
                .collect_view()
                .into_any()
        }
    };

    view! {
        <div class="matches-page">
            <Show
                when=profile_ready
                fallback=|| {
                    view! {
                        <div class="matches-page__incomplete">
                            <h2>"Complete your profile"</h2>
                            <p>"We need your location to find matches for you."</p>
                            <a href="/setup" class="btn btn-primary">"Complete Profile"</a>
                        </div>
                    }
                }
            >
                <h1>"Your Matches"</h1>
                <p class="matches-page__subtitle">"People in " {location} " compatible with you."</p>
                <div class="matches-page__grid">{results.clone()}</div>
            </Show>
        </div>
    }
}
