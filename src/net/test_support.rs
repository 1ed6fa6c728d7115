//! Scripted gateway for store and flow tests.

use std::sync::Mutex;

use super::api::{ApiError, AuthGateway};
use super::types::{AuthResponse, Credentials, NewAccount, ProfileUpdate, Role, User, UserPatch};

pub(crate) fn user(id: &str, role: Role) -> User {
    User { id: id.to_owned(), name: format!("user {id}"), email: format!("{id}@example.com"), role, ..User::default() }
}

fn unscripted<T>() -> Result<T, ApiError> {
    Err(ApiError::NetworkFailure("unscripted call".to_owned()))
}

/// Each field is the canned answer for one endpoint; `None` fails the call.
#[derive(Default)]
pub(crate) struct FakeGateway {
    pub auth: Option<Result<AuthResponse, ApiError>>,
    pub me: Option<Result<User, ApiError>>,
    pub profile: Option<Result<UserPatch, ApiError>>,
    pub matches: Option<Result<Vec<User>, ApiError>>,
    pub users: Option<Result<Vec<User>, ApiError>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    /// Calls made so far, as `endpoint` or `endpoint:token`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl AuthGateway for FakeGateway {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.record(format!("authenticate:{}", credentials.email));
        self.auth.clone().unwrap_or_else(unscripted)
    }

    async fn register(&self, account: &NewAccount) -> Result<AuthResponse, ApiError> {
        self.record(format!("register:{}", account.email));
        self.auth.clone().unwrap_or_else(unscripted)
    }

    async fn fetch_current_user(&self, token: &str) -> Result<User, ApiError> {
        self.record(format!("me:{token}"));
        self.me.clone().unwrap_or_else(unscripted)
    }

    async fn update_profile(&self, token: &str, _update: &ProfileUpdate) -> Result<UserPatch, ApiError> {
        self.record(format!("profile:{token}"));
        self.profile.clone().unwrap_or_else(unscripted)
    }

    async fn fetch_matches(&self, token: &str) -> Result<Vec<User>, ApiError> {
        self.record(format!("matches:{token}"));
        self.matches.clone().unwrap_or_else(unscripted)
    }

    async fn fetch_all_users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        self.record(format!("users:{token}"));
        self.users.clone().unwrap_or_else(unscripted)
    }
}
