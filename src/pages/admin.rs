//! Admin dashboard listing every registered user.

use leptos::prelude::*;

use crate::net::api::HttpGateway;
use crate::net::flows;
use crate::net::types::User;
use crate::state::auth::use_auth;

#[component]
pub fn AdminPage() -> impl IntoView {
    let auth = use_auth();
    let gateway = expect_context::<HttpGateway>();
    let users = RwSignal::new(None::<Result<Vec<User>, String>>);

    let store = auth.store().clone();
    Effect::new(move || {
        if users.get_untracked().is_some() {
            return;
        }
        let store = store.clone();
        let gateway = gateway.clone();
        leptos::task::spawn_local(async move {
            let result = flows::fetch_all_users(&store, &gateway).await.map_err(|e| e.user_message());
            users.set(Some(result));
        });
    });

    let rows = move || match users.get() {
        None => view! { <div class="loading-placeholder">"Loading dashboard..."</div> }.into_any(),
        Some(Err(msg)) => view! { <p class="form-message">"Failed to load users: " {msg}</p> }.into_any(),
        Some(Ok(list)) => view! {
            <table class="admin-table">
                <thead>
                    <tr>
                        <th>"User"</th>
                        <th>"Email"</th>
                        <th>"Role"</th>
                        <th>"Location"</th>
                        <th>"Status"</th>
                        <th>"Joined"</th>
                    </tr>
                </thead>
                <tbody>
                    {list
                        .into_iter()
                        .map(|u| {
                            let role = if u.is_admin() { "Admin" } else { "User" };
                            let name = u.display_name().to_owned();
                            let status = if u.profile_complete { "Active" } else { "Incomplete" };
                            let joined = u.joined_on().unwrap_or("-").to_owned();
                            view! {
                                <tr>
                                    <td>{name}</td>
                                    <td>{u.email}</td>
                                    <td>{role}</td>
                                    <td>{u.location.unwrap_or_else(|| "-".to_owned())}</td>
                                    <td>{status}</td>
                                    <td>{joined}</td>
                                </tr>
                            }
                        })
                        .collect_view()}
                </tbody>
            </table>
        }
        .into_any(),
    };

    view! {
        <div class="admin-page">
            <h1>"Admin Dashboard"</h1>
            {rows}
        </div>
    }
}
