//! # sharespace-client
//!
//! Leptos + WASM frontend for the ShareSpace roommate-matching application.
//!
//! The core of this crate is the client-side session: a process-wide
//! [`state::session::SessionStore`] holding who is logged in, the
//! [`state::auth`] accessor that mirrors it into the component tree, and the
//! [`util::auth`] route-guard decisions built on top. Pages and components
//! reach the backend through the [`net::api::AuthGateway`] contract.

pub mod app;
pub mod components;
pub mod config;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// Browser entry point: install console hooks and hydrate the server render.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) only fails to replace the logger.
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}
