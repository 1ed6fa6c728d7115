//! Application state shared through Leptos context.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` owns the authoritative login state; `auth` mirrors it into a
//! reactive signal for components.

pub mod auth;
pub mod session;
