//! Networking modules for the gateway REST boundary.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` defines the gateway contract and its HTTP adapter, `flows` ties
//! gateway calls to the session store, and `types` defines the wire schema.

pub mod api;
pub mod flows;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
