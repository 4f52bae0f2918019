//! Token Manager
//!
//! Owns the process-wide access token for the upstream API. The token is
//! acquired lazily, cached, and replaced whenever a refresh succeeds.
//!
//! Refreshes are single-flight: while a credential exchange is in flight,
//! further `refresh()` callers await the same shared future and receive the
//! same token or the same error.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{AccessToken, Credentials};
use crate::upstream::{Upstream, UpstreamRequest};

use super::AuthError;

type RefreshFuture = Shared<BoxFuture<'static, Result<AccessToken, AuthError>>>;

struct PendingRefresh {
    id: u64,
    future: RefreshFuture,
}

#[derive(Default)]
struct TokenState {
    current: Option<AccessToken>,
    pending: Option<PendingRefresh>,
    next_refresh_id: u64,
}

struct Inner {
    upstream: Arc<dyn Upstream>,
    credentials: Credentials,
    state: Mutex<TokenState>,
}

/// Shared handle to the current upstream access token
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

impl TokenManager {
    pub fn new(upstream: Arc<dyn Upstream>, credentials: Credentials) -> Self {
        Self {
            inner: Arc::new(Inner {
                upstream,
                credentials,
                state: Mutex::new(TokenState::default()),
            }),
        }
    }

    /// Seed the cache with a token obtained out of band
    pub fn with_initial_token(self, token: AccessToken) -> Self {
        self.inner.state.lock().current = Some(token);
        self
    }

    /// The cached token, without refreshing
    pub fn current(&self) -> Option<AccessToken> {
        self.inner.state.lock().current.clone()
    }

    /// Return the cached token, refreshing first if there is none or its
    /// known expiry has passed.
    pub async fn ensure_valid_token(&self) -> Result<AccessToken, AuthError> {
        if let Some(token) = self.usable_token(Utc::now()) {
            return Ok(token);
        }

        tracing::debug!("No usable access token cached, refreshing");
        self.refresh().await
    }

    /// Exchange the stored credentials for a new token.
    ///
    /// On failure the previously cached token, if any, stays in place.
    pub async fn refresh(&self) -> Result<AccessToken, AuthError> {
        let future = {
            let mut state = self.inner.state.lock();
            self.start_or_join(&mut state)
        };

        future.await
    }

    /// Replace `rejected`, the token an upstream call was just refused with.
    ///
    /// When the cache already holds a different token, another caller has
    /// replaced it since `rejected` was read, and that token is returned
    /// without a new exchange.
    pub async fn refresh_stale(
        &self,
        rejected: Option<&AccessToken>,
    ) -> Result<AccessToken, AuthError> {
        let future = {
            let mut state = self.inner.state.lock();
            let replaced = state.current.as_ref().filter(|current| {
                rejected.map_or(true, |rejected| current.value() != rejected.value())
            });

            if let Some(current) = replaced {
                tracing::debug!("Rejected token already replaced, reusing the cached one");
                return Ok(current.clone());
            }

            self.start_or_join(&mut state)
        };

        future.await
    }

    /// Join the in-flight exchange, or start one. Called with the state locked.
    fn start_or_join(&self, state: &mut TokenState) -> RefreshFuture {
        let in_flight = state
            .pending
            .as_ref()
            .map(|pending| (pending.id, pending.future.clone()));

        match in_flight {
            Some((id, future)) => {
                tracing::debug!(refresh_id = id, "Joining in-flight token refresh");
                future
            }
            None => {
                let id = state.next_refresh_id;
                state.next_refresh_id += 1;

                let future = exchange_credentials(Arc::clone(&self.inner), id)
                    .boxed()
                    .shared();
                state.pending = Some(PendingRefresh {
                    id,
                    future: future.clone(),
                });
                future
            }
        }
    }

    fn usable_token(&self, now: DateTime<Utc>) -> Option<AccessToken> {
        self.inner
            .state
            .lock()
            .current
            .as_ref()
            .filter(|token| !token.is_expired_at(now))
            .cloned()
    }
}

/// Runs once per refresh generation, however many callers await it
async fn exchange_credentials(inner: Arc<Inner>, id: u64) -> Result<AccessToken, AuthError> {
    tracing::info!(
        refresh_id = id,
        username = %inner.credentials.username(),
        "Exchanging credentials for a new access token"
    );

    let request = UpstreamRequest::login(&inner.credentials);
    let outcome = match inner.upstream.send(&request, None).await {
        Ok(envelope) => envelope
            .into_result()
            .map_err(AuthError::from)
            .and_then(|result| parse_login_result(result, Utc::now())),
        Err(err) => Err(AuthError::from(err)),
    };

    let mut state = inner.state.lock();
    if state.pending.as_ref().is_some_and(|pending| pending.id == id) {
        state.pending = None;
    }

    match &outcome {
        Ok(token) => {
            tracing::info!(
                refresh_id = id,
                expires_at = ?token.expires_at(),
                "Access token refreshed"
            );
            state.current = Some(token.clone());
        }
        Err(err) => {
            tracing::warn!(refresh_id = id, error = %err, "Access token refresh failed");
        }
    }

    outcome
}

/// `result` payload of the authorization endpoint
#[derive(Debug, Deserialize)]
struct LoginResult {
    #[serde(rename = "Token", default)]
    token: Option<String>,
    #[serde(rename = "RefreshToken", default)]
    refresh_token: Option<String>,
    #[serde(rename = "Expiration", default)]
    expiration: Option<DateTime<Utc>>,
    #[serde(rename = "ExpiresIn", default)]
    expires_in: Option<i64>,
}

fn parse_login_result(result: Value, now: DateTime<Utc>) -> Result<AccessToken, AuthError> {
    if result.is_null() {
        return Err(AuthError::MissingToken);
    }

    let login: LoginResult =
        serde_json::from_value(result).map_err(|e| AuthError::Malformed(e.to_string()))?;

    let value = login
        .token
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let mut token = AccessToken::new(value);
    if let Some(refresh_token) = login.refresh_token.filter(|t| !t.is_empty()) {
        token = token.with_refresh_token(refresh_token);
    }

    let expires_at = login.expiration.or_else(|| {
        login
            .expires_in
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
    });
    if let Some(expires_at) = expires_at {
        token = token.with_expiry(expires_at);
    }

    Ok(token)
}
