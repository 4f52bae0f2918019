//! Access token and credentials
//!
//! Credential material used against the upstream financial-data API.
//! Neither type prints its secret through `Debug`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Bearer token issued by the upstream authorization endpoint.
///
/// # Example
/// ```
/// use chrono::{Duration, Utc};
/// use finance_gateway::domain::AccessToken;
///
/// let token = AccessToken::new("abc").with_expiry(Utc::now() - Duration::seconds(1));
/// assert_eq!(token.value(), "abc");
/// assert!(token.is_expired_at(Utc::now()));
/// ```
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create a token with no expiry metadata
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// The bearer credential string
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// A token without expiry metadata never expires locally; only a 401
    /// from upstream retires it.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Username/password pair exchanged for an [`AccessToken`]
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Body accepted by the upstream authorization endpoint
    pub fn login_body(&self) -> Value {
        json!({
            "Username": self.username,
            "Password": self.password,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
