//! Profile edit form (`/setup`).
//!
//! SYSTEM CONTEXT
//! ==============
//! Reached right after registration and from the profile page. Submits a
//! multipart form through `flows::update_profile`, which validates locally,
//! merges the saved fields into the session user, and logs out on a 401.
//! On mount the form is refilled from a fresh `/auth/me` read.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::net::api::HttpGateway;
use crate::net::flows;
use crate::net::types::ProfileUpdate;
use crate::state::auth::use_auth;

const PROFILE_ROUTE: &str = "/profile";

type Choices = &'static [(&'static str, &'static str)];

const GENDERS: Choices = &[("Male", "Male"), ("Female", "Female"), ("Other", "Other")];
const SMOKING: Choices = &[("non-smoker", "Non-smoker"), ("smoker", "Smoker"), ("occasional", "Occasional")];
const CLEANLINESS: Choices = &[("standard", "Standard"), ("neat", "Neat freak"), ("relaxed", "Relaxed")];
const YES_NO: Choices = &[("yes", "Yes"), ("no", "No")];
const FOOD: Choices = &[("any", "Any"), ("veg", "Vegetarian"), ("non-veg", "Non-vegetarian"), ("vegan", "Vegan")];
const SLEEP: Choices = &[("flexible", "Flexible"), ("early-bird", "Early bird"), ("night-owl", "Night owl")];

type Form = RwSignal<ProfileUpdate, LocalStorage>;

fn text_field(
    label: &'static str,
    kind: &'static str,
    form: Form,
    get: fn(&ProfileUpdate) -> String,
    set: fn(&mut ProfileUpdate, String),
) -> impl IntoView {
    view! {
        <label class="form-field">
            <span class="form-field__label">{label}</span>
            <input
                class="form-field__input"
                type=kind
                prop:value=move || form.with(get)
                on:input=move |ev| form.update(|f| set(f, event_target_value(&ev)))
            />
        </label>
    }
}

fn choice_field(
    label: &'static str,
    choices: Choices,
    form: Form,
    get: fn(&ProfileUpdate) -> String,
    set: fn(&mut ProfileUpdate, String),
) -> impl IntoView {
    view! {
        <label class="form-field">
            <span class="form-field__label">{label}</span>
            <select
                class="form-field__input"
                prop:value=move || form.with(get)
                on:change=move |ev| form.update(|f| set(f, event_target_value(&ev)))
            >
                {choices
                    .iter()
                    .map(|(value, text)| view! { <option value=*value>{*text}</option> })
                    .collect_view()}
            </select>
        </label>
    }
}

#[component]
pub fn ProfileSetupPage() -> impl IntoView {
    let auth = use_auth();
    let state = auth.state();
    let gateway = expect_context::<HttpGateway>();
    let navigate = use_navigate();

    let initial = state.get_untracked().user.unwrap_or_default();
    let is_admin = initial.is_admin();
    let form: Form = RwSignal::new_local(ProfileUpdate::from_user(&initial));
    let image_input = NodeRef::<leptos::html::Input>::new();
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    // Reload the server copy so edits made elsewhere show up in the form.
    let refresh_store = auth.store().clone();
    let refresh_gateway = gateway.clone();
    Effect::new(move || {
        let store = refresh_store.clone();
        let gateway = refresh_gateway.clone();
        leptos::task::spawn_local(async move {
            match flows::refresh_user(&store, &gateway).await {
                Ok(fresh) => form.set(ProfileUpdate::from_user(&fresh)),
                Err(e) => leptos::logging::warn!("profile setup: could not refresh user ({e})"),
            }
        });
    });

    let store = auth.store().clone();
    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        #[allow(unused_mut)]
        let mut update = form.get_untracked();
        #[cfg(feature = "hydrate")]
        {
            update.image = image_input.get_untracked().and_then(|input| input.files()).and_then(|files| files.get(0));
        }
        busy.set(true);
        info.set("Saving...".to_owned());

        let store = store.clone();
        let gateway = gateway.clone();
        let navigate = navigate.clone();
        leptos::task::spawn_local(async move {
            match flows::update_profile(&store, &gateway, &update).await {
                Ok(_) => {
                    info.set(String::new());
                    navigate(PROFILE_ROUTE, NavigateOptions::default());
                }
                Err(e) => info.set(e.user_message()),
            }
            busy.set(false);
        });
    };

    view! {
        <div class="profile-setup">
            <h1>"Your profile"</h1>
            <form class="profile-form" on:submit=on_submit>
                {text_field("Full name", "text", form, |f| f.name.clone(), |f, v| f.name = v)}
                {text_field("Email", "email", form, |f| f.email.clone(), |f, v| f.email = v)}
                {text_field("New password", "password", form, |f| f.password.clone(), |f, v| f.password = v)}
                <Show when=move || !is_admin>
                    {text_field("Location", "text", form, |f| f.location.clone(), |f, v| f.location = v)}
                    {text_field("Budget", "number", form, |f| f.budget.clone(), |f, v| f.budget = v)}
                    {choice_field("Gender", GENDERS, form, |f| f.gender.clone(), |f, v| f.gender = v)}
                    {choice_field("Smoking", SMOKING, form, |f| f.smoking.clone(), |f, v| f.smoking = v)}
                    {choice_field("Cleanliness", CLEANLINESS, form, |f| f.cleanliness.clone(), |f, v| f.cleanliness = v)}
                    {choice_field(
                        "Looking for a roommate",
                        YES_NO,
                        form,
                        |f| f.is_looking_for_roommate.clone(),
                        |f, v| f.is_looking_for_roommate = v,
                    )}
                    {choice_field("Has an apartment", YES_NO, form, |f| f.has_apartment.clone(), |f, v| f.has_apartment = v)}
                    {choice_field("Food", FOOD, form, |f| f.food_preference.clone(), |f, v| f.food_preference = v)}
                    {choice_field("Sleep", SLEEP, form, |f| f.sleep_schedule.clone(), |f, v| f.sleep_schedule = v)}
                    <label class="form-field">
                        <span class="form-field__label">"About you"</span>
                        <textarea
                            class="form-field__input"
                            prop:value=move || form.with(|f| f.bio.clone())
                            on:input=move |ev| form.update(|f| f.bio = event_target_value(&ev))
                        ></textarea>
                    </label>
                </Show>
                <label class="form-field">
                    <span class="form-field__label">"Profile photo"</span>
                    <input class="form-field__input" type="file" accept="image/*" node_ref=image_input/>
                </label>
                <label class="form-field form-field--inline">
                    <input
                        type="checkbox"
                        prop:checked=move || form.with(|f| f.remove_image)
                        on:change=move |ev| form.update(|f| f.remove_image = event_target_checked(&ev))
                    />
                    <span>"Remove current photo"</span>
                </label>
                <button class="btn btn-primary" type="submit" disabled=move || busy.get()>
                    "Save profile"
                </button>
            </form>
            <Show when=move || !info.get().is_empty()>
                <p class="form-message">{move || info.get()}</p>
            </Show>
        </div>
    }
}
