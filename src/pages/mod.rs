//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns route-scoped orchestration and delegates session changes
//! to `net::flows`.

pub mod admin;
pub mod home;
pub mod login;
pub mod matches;
pub mod profile;
pub mod profile_setup;
pub mod register;
