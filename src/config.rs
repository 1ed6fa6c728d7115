//! Session configuration resolved at build time.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser bundle has no process environment, so overrides are baked in
//! with `option_env!` when the crate is compiled. The resolved config is
//! provided through Leptos context so guards and pages share one copy.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://sharespace-backend-xh5c.onrender.com";
pub const DEFAULT_TOKEN_KEY: &str = "token";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_HOME_ROUTE: &str = "/";
pub const DEFAULT_CONFIRM_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid confirmation timeout {0:?}: expected milliseconds")]
    InvalidTimeout(String),
}

/// Where a route guard sends a caller it refuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Unauthenticated landing route.
    Login,
    /// Default authenticated landing route.
    Home,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Gateway origin without a trailing slash.
    pub api_base_url: String,
    /// `localStorage` key holding the bearer token.
    pub token_key: String,
    pub login_route: String,
    pub home_route: String,
    /// Deadline for the boot-time `/auth/me` confirmation; `None` waits forever.
    pub confirm_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            token_key: DEFAULT_TOKEN_KEY.to_owned(),
            login_route: DEFAULT_LOGIN_ROUTE.to_owned(),
            home_route: DEFAULT_HOME_ROUTE.to_owned(),
            confirm_timeout: Some(Duration::from_millis(DEFAULT_CONFIRM_TIMEOUT_MS)),
        }
    }
}

impl SessionConfig {
    /// Build config from compile-time environment overrides.
    ///
    /// Optional:
    /// - `SHARESPACE_API_URL`: gateway origin (default hosted backend)
    /// - `SHARESPACE_TOKEN_KEY`: storage key (default `token`)
    /// - `SHARESPACE_CONFIRM_TIMEOUT_MS`: default 15000, `0` disables
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_raw(
            option_env!("SHARESPACE_API_URL"),
            option_env!("SHARESPACE_TOKEN_KEY"),
            option_env!("SHARESPACE_CONFIRM_TIMEOUT_MS"),
        )
    }

    /// Like [`Self::from_build_env`], but falls back to defaults on a bad value.
    pub fn from_build_env_or_default() -> Self {
        Self::from_build_env().unwrap_or_else(|e| {
            leptos::logging::warn!("session config: {e}; using defaults");
            Self::default()
        })
    }

    fn from_raw(
        api_base_url: Option<&str>,
        token_key: Option<&str>,
        confirm_timeout_ms: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let api_base_url = non_empty(api_base_url)
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_owned();
        let token_key = non_empty(token_key).map_or(defaults.token_key, str::to_owned);
        let confirm_timeout = match non_empty(confirm_timeout_ms) {
            Some(raw) => parse_timeout_ms(raw)?,
            None => defaults.confirm_timeout,
        };
        Ok(Self { api_base_url, token_key, confirm_timeout, ..defaults })
    }

    /// Route path a guard redirect resolves to.
    pub fn route_for(&self, target: RedirectTarget) -> &str {
        match target {
            RedirectTarget::Login => &self.login_route,
            RedirectTarget::Home => &self.home_route,
        }
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_timeout_ms(raw: &str) -> Result<Option<Duration>, ConfigError> {
    let ms = raw.parse::<u64>().map_err(|_| ConfigError::InvalidTimeout(raw.to_owned()))?;
    Ok((ms > 0).then(|| Duration::from_millis(ms)))
}
