//! Gateway contract and its REST adapter.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Native/SSR builds: stubs returning `NetworkFailure`, since the gateway is
//! only reachable from the browser.
//!
//! ERROR HANDLING
//! ==============
//! Every HTTP status is classified into [`ApiError`] so callers can tell a
//! rejected credential exchange from a revoked token. The adapter never
//! panics; the session store decides what each failure means for the session.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use super::types::{AuthResponse, Credentials, NewAccount, ProfileUpdate, User, UserPatch};
use crate::config::SessionConfig;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const ME_PATH: &str = "/auth/me";
pub const PROFILE_PATH: &str = "/user/profile";
pub const MATCHES_PATH: &str = "/user/matches";
pub const ADMIN_USERS_PATH: &str = "/api/admin/users";

/// Failure taxonomy for gateway calls.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Login or registration rejected by the backend.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    /// The bearer token was rejected on an authenticated call.
    #[error("session token rejected")]
    Unauthorized,
    /// The gateway could not be reached or did not answer in time.
    #[error("network failure: {0}")]
    NetworkFailure(String),
    /// A submission failed local or server-side validation.
    #[error("validation failed: {0}")]
    ValidationFailure(String),
    /// Any other non-success status.
    #[error("server returned status {status}")]
    Server { status: u16 },
    /// The response body did not match the expected schema.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Which side of the auth boundary a request sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// `authenticate` / `register`: no token attached yet.
    CredentialExchange,
    /// Carries `Authorization: Bearer <token>`.
    Authenticated,
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: Option<String>, kind: CallKind) -> Self {
        match (kind, status) {
            (CallKind::Authenticated, 401) => Self::Unauthorized,
            (CallKind::Authenticated, 400 | 422) => {
                Self::ValidationFailure(message.unwrap_or_else(|| "request rejected".to_owned()))
            }
            (CallKind::CredentialExchange, 400 | 401 | 403 | 404 | 409 | 422) => {
                Self::InvalidCredentials(message.unwrap_or_else(|| "invalid email or password".to_owned()))
            }
            _ => Self::Server { status },
        }
    }

    /// Text suitable for a form banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials(msg) | Self::ValidationFailure(msg) => msg.clone(),
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_owned(),
            Self::NetworkFailure(_) => "Could not reach the server. Try again shortly.".to_owned(),
            Self::Server { status } => format!("The server could not complete the request ({status})."),
            Self::Decode(_) => "The server sent an unexpected response.".to_owned(),
        }
    }
}

/// Network boundary the session core depends on.
///
/// Authenticated calls receive the token explicitly; attaching it as a bearer
/// credential is the implementation's job, reacting to `Unauthorized` is the
/// caller's (see `net::flows`).
#[allow(async_fn_in_trait)]
pub trait AuthGateway {
    /// `POST /auth/login`.
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError>;
    /// `POST /auth/register`.
    async fn register(&self, account: &NewAccount) -> Result<AuthResponse, ApiError>;
    /// `GET /auth/me`, the boot-time confirmation fetch.
    async fn fetch_current_user(&self, token: &str) -> Result<User, ApiError>;
    /// `PUT /user/profile` as multipart form data.
    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<UserPatch, ApiError>;
    /// `GET /user/matches`.
    async fn fetch_matches(&self, token: &str) -> Result<Vec<User>, ApiError>;
    /// `GET /api/admin/users`.
    async fn fetch_all_users(&self, token: &str) -> Result<Vec<User>, ApiError>;
}

/// `gloo-net` implementation of [`AuthGateway`].
#[derive(Clone, Debug)]
pub struct HttpGateway {
    base_url: String,
    confirm_timeout: Option<Duration>,
}

impl HttpGateway {
    pub fn new(config: &SessionConfig) -> Self {
        Self { base_url: config.api_base_url.clone(), confirm_timeout: config.confirm_timeout }
    }

    /// Absolute URL for a gateway path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn bearer_header(token: &str) -> String {
    format!("Bearer {token}")
}

#[cfg(any(test, feature = "hydrate"))]
fn timed_out_message(timeout: Duration) -> String {
    format!("no response within {}ms", timeout.as_millis())
}

/// Error payload shapes the backend uses (`{"msg": ...}` mostly).
#[cfg(any(test, feature = "hydrate"))]
#[derive(Debug, Default, serde::Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

#[cfg(any(test, feature = "hydrate"))]
impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error)
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
    }
}

#[cfg(not(feature = "hydrate"))]
fn unavailable<T>() -> Result<T, ApiError> {
    Err(ApiError::NetworkFailure("not available on server".to_owned()))
}

#[cfg(feature = "hydrate")]
mod browser {
    use std::time::Duration;

    use futures::future::{Either, select};
    use gloo_net::http::{Request, Response};
    use serde::de::DeserializeOwned;

    use super::{ApiError, CallKind, ErrorBody, timed_out_message};
    use crate::net::types::ProfileUpdate;

    pub(super) fn transport(err: gloo_net::Error) -> ApiError {
        ApiError::NetworkFailure(err.to_string())
    }

    pub(super) async fn read<T: DeserializeOwned>(resp: Response, kind: CallKind) -> Result<T, ApiError> {
        if !resp.ok() {
            let message = resp.json::<ErrorBody>().await.ok().and_then(ErrorBody::into_message);
            return Err(ApiError::from_status(resp.status(), message, kind));
        }
        resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub(super) async fn send<T: DeserializeOwned>(req: Request, kind: CallKind) -> Result<T, ApiError> {
        let resp = req.send().await.map_err(transport)?;
        read(resp, kind).await
    }

    /// Race `fut` against a timer; expiry is reported as a network failure.
    pub(super) async fn with_deadline<T>(
        fut: impl Future<Output = Result<T, ApiError>>,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError> {
        let Some(timeout) = timeout else {
            return fut.await;
        };
        let fut = std::pin::pin!(fut);
        let timer = std::pin::pin!(gloo_timers::future::sleep(timeout));
        match select(fut, timer).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(ApiError::NetworkFailure(timed_out_message(timeout))),
        }
    }

    pub(super) fn profile_form(update: &ProfileUpdate) -> Result<web_sys::FormData, ApiError> {
        let form_error = |_| ApiError::ValidationFailure("could not encode profile form".to_owned());
        let form = web_sys::FormData::new().map_err(form_error)?;
        for (key, value) in update.form_fields() {
            form.append_with_str(key, &value).map_err(form_error)?;
        }
        if let Some(file) = &update.image {
            form.append_with_blob("profileImage", file).map_err(form_error)?;
        }
        Ok(form)
    }
}

impl AuthGateway for HttpGateway {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            let req = gloo_net::http::Request::post(&self.url(LOGIN_PATH))
                .json(credentials)
                .map_err(browser::transport)?;
            browser::send(req, CallKind::CredentialExchange).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = credentials;
            unavailable()
        }
    }

    async fn register(&self, account: &NewAccount) -> Result<AuthResponse, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            let req = gloo_net::http::Request::post(&self.url(REGISTER_PATH))
                .json(account)
                .map_err(browser::transport)?;
            browser::send(req, CallKind::CredentialExchange).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = account;
            unavailable()
        }
    }

    async fn fetch_current_user(&self, token: &str) -> Result<User, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            let req = gloo_net::http::Request::get(&self.url(ME_PATH))
                .header("Authorization", &bearer_header(token))
                .build()
                .map_err(browser::transport)?;
            browser::with_deadline(browser::send(req, CallKind::Authenticated), self.confirm_timeout).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (token, self.confirm_timeout);
            unavailable()
        }
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<UserPatch, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            // Content-Type is left to the browser so the multipart boundary is set.
            let form = browser::profile_form(update)?;
            let req = gloo_net::http::Request::put(&self.url(PROFILE_PATH))
                .header("Authorization", &bearer_header(token))
                .body(form)
                .map_err(browser::transport)?;
            browser::send(req, CallKind::Authenticated).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (token, update);
            unavailable()
        }
    }

    async fn fetch_matches(&self, token: &str) -> Result<Vec<User>, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            let req = gloo_net::http::Request::get(&self.url(MATCHES_PATH))
                .header("Authorization", &bearer_header(token))
                .build()
                .map_err(browser::transport)?;
            browser::send(req, CallKind::Authenticated).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = token;
            unavailable()
        }
    }

    async fn fetch_all_users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            let req = gloo_net::http::Request::get(&self.url(ADMIN_USERS_PATH))
                .header("Authorization", &bearer_header(token))
                .build()
                .map_err(browser::transport)?;
            browser::send(req, CallKind::Authenticated).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = token;
            unavailable()
        }
    }
}
