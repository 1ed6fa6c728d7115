//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render route guards and app chrome while reading the shared
//! session from Leptos context.

pub mod guard;
pub mod navbar;
