//! Session-aware request flows shared by pages.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages call these instead of the gateway directly. Each flow reads the
//! credential from the store, makes the call, and feeds the outcome back:
//! credential exchanges commit a login, profile saves merge into the current
//! user, and an `Unauthorized` answer on any authenticated call logs out.

#[cfg(test)]
#[path = "flows_test.rs"]
mod flows_test;

use super::api::{ApiError, AuthGateway};
use super::types::{Credentials, NewAccount, ProfileUpdate, Role, User};
use crate::state::session::{Credential, SessionError, SessionStatus, SessionStore};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl FlowError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Session(SessionError::NotAuthenticated) => "Please sign in first.".to_owned(),
            Self::Session(SessionError::Superseded) => "Your session changed; please try again.".to_owned(),
            Self::Session(SessionError::EmptyToken) => "The server did not issue a session.".to_owned(),
        }
    }
}

/// Boot-time hydration against `gateway`.
pub async fn initialize<G: AuthGateway>(store: &SessionStore, gateway: &G) -> SessionStatus {
    store.initialize(gateway).await
}

/// Exchange email and password for a session and commit it.
///
/// # Errors
///
/// Gateway failures pass through unchanged; a response arriving after a
/// logout committed is [`SessionError::Superseded`]. A login that commits
/// in the meantime is simply replaced.
pub async fn login<G: AuthGateway>(
    store: &SessionStore,
    gateway: &G,
    credentials: &Credentials,
) -> Result<User, FlowError> {
    let issued_at = store.logout_epoch();
    let response = gateway.authenticate(credentials).await?;
    store.login_if_current(issued_at, response.user.clone(), response.token)?;
    Ok(response.user)
}

/// Create an account and log straight into it.
///
/// # Errors
///
/// As [`login`].
pub async fn register<G: AuthGateway>(
    store: &SessionStore,
    gateway: &G,
    account: &NewAccount,
) -> Result<User, FlowError> {
    let issued_at = store.logout_epoch();
    let response = gateway.register(account).await?;
    store.login_if_current(issued_at, response.user.clone(), response.token)?;
    Ok(response.user)
}

/// Run `call` with the current credential; a 401 ends that session.
async fn authorized<T, F, Fut>(store: &SessionStore, call: F) -> Result<(T, Credential), FlowError>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let credential = store.credential().ok_or(SessionError::NotAuthenticated)?;
    match call(credential.token().to_owned()).await {
        Ok(value) => Ok((value, credential)),
        Err(ApiError::Unauthorized) => {
            store.expire(&credential);
            Err(ApiError::Unauthorized.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Validate and submit the profile form, then merge the saved fields into
/// the session user.
///
/// # Errors
///
/// Local validation problems are [`ApiError::ValidationFailure`] and never
/// reach the gateway.
pub async fn update_profile<G: AuthGateway>(
    store: &SessionStore,
    gateway: &G,
    update: &ProfileUpdate,
) -> Result<User, FlowError> {
    let role = store.user().map_or(Role::Regular, |u| u.role);
    update.validate(role).map_err(ApiError::ValidationFailure)?;
    let (patch, credential) = authorized(store, |token| async move { gateway.update_profile(&token, update).await }).await?;
    Ok(store.update_user_for(&credential, patch)?)
}

/// Re-read the current user from `/auth/me` and merge it into the session.
///
/// # Errors
///
/// [`SessionError::Superseded`] if the session changed while the fetch was
/// outstanding, otherwise as [`fetch_matches`].
pub async fn refresh_user<G: AuthGateway>(store: &SessionStore, gateway: &G) -> Result<User, FlowError> {
    let (fresh, credential) = authorized(store, |token| async move { gateway.fetch_current_user(&token).await }).await?;
    Ok(store.update_user_for(&credential, fresh.into())?)
}

/// Roommate suggestions for the current user.
///
/// # Errors
///
/// [`SessionError::NotAuthenticated`] when logged out, otherwise gateway failures.
pub async fn fetch_matches<G: AuthGateway>(store: &SessionStore, gateway: &G) -> Result<Vec<User>, FlowError> {
    let (matches, _) = authorized(store, |token| async move { gateway.fetch_matches(&token).await }).await?;
    Ok(matches)
}

/// Every registered user, for the admin dashboard.
///
/// # Errors
///
/// As [`fetch_matches`]; the backend answers non-admins with 403, which is
/// reported as a server error and leaves the session alone.
pub async fn fetch_all_users<G: AuthGateway>(store: &SessionStore, gateway: &G) -> Result<Vec<User>, FlowError> {
    let (users, _) = authorized(store, |token| async move { gateway.fetch_all_users(&token).await }).await?;
    Ok(users)
}
