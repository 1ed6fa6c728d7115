//! Read-only view of the current user's profile.

use leptos::prelude::*;

use crate::net::api::HttpGateway;
use crate::state::auth::use_auth;

#[component]
pub fn ProfilePage() -> impl IntoView {
    let state = use_auth().state();
    let gateway = expect_context::<HttpGateway>();

    move || {
        let Some(user) = state.get().user else {
            return ().into_any();
        };
        let image_url = user.profile_image.as_ref().map(|img| gateway.url(&format!("/uploads/{img}")));
        let field = |label: &'static str, value: Option<String>| {
            view! {
                <div class="profile-page__field">
                    <dt>{label}</dt>
                    <dd>{value.unwrap_or_else(|| "-".to_owned())}</dd>
                </div>
            }
        };
        let is_admin = user.is_admin();

        view! {
            <div class="profile-page">
                <div class="profile-page__header" class:profile-page__header--admin=is_admin>
                    {image_url.map(|src| view! { <img class="profile-page__avatar" src=src alt=user.name.clone()/> })}
                    <div>
                        <h1>{user.display_name().to_owned()}</h1>
                        <p>{user.email.clone()}</p>
                        <Show when=move || is_admin>
                            <span class="badge badge--error">"Admin"</span>
                        </Show>
                    </div>
                    <a href="/setup" class="btn">"Edit Profile"</a>
                </div>
                {(!is_admin).then(|| view! {
                    <dl class="profile-page__details">
                        {field("Location", user.location.clone())}
                        {field("Budget", user.budget.clone())}
                        {field("Gender", user.gender.clone())}
                        {field("Smoking", user.smoking.clone())}
                        {field("Cleanliness", user.cleanliness.clone())}
                        {field("Food", user.food_preference.clone())}
                        {field("Sleep", user.sleep_schedule.clone())}
                        {field("Looking for a roommate", user.is_looking_for_roommate.clone())}
                        {field("Has an apartment", user.has_apartment.clone())}
                        {field("About", user.bio.clone())}
                    </dl>
                })}
            </div>
        }
        .into_any()
    }
}
