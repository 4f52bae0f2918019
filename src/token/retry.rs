//! Retry Interceptor
//!
//! Wraps upstream calls with the current bearer token. A 401 triggers one
//! token refresh and one resubmission of the identical request; every other
//! failure passes straight through.

use std::sync::Arc;

use crate::upstream::{Envelope, Upstream, UpstreamError, UpstreamRequest};

use super::TokenManager;

/// How many authorization-triggered retries a call may still perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBudget {
    Available,
    Spent,
}

impl RetryBudget {
    /// Budget for one retry after a 401
    pub fn once() -> Self {
        RetryBudget::Available
    }

    /// Consume the budget, returning what remains, or `None` if already spent
    pub fn spend(self) -> Option<Self> {
        match self {
            RetryBudget::Available => Some(RetryBudget::Spent),
            RetryBudget::Spent => None,
        }
    }
}

/// Upstream transport that authenticates and retries on 401
#[derive(Clone)]
pub struct AuthorizedUpstream {
    upstream: Arc<dyn Upstream>,
    tokens: TokenManager,
}

impl AuthorizedUpstream {
    pub fn new(upstream: Arc<dyn Upstream>, tokens: TokenManager) -> Self {
        Self { upstream, tokens }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Send `request` with at most one authorization-triggered retry
    pub async fn call(&self, request: &UpstreamRequest) -> Result<Envelope, UpstreamError> {
        self.call_with_budget(request, RetryBudget::once()).await
    }

    /// Send `request`, retrying after a 401 while `budget` allows.
    ///
    /// When the refresh itself fails the original authorization failure is
    /// returned.
    pub async fn call_with_budget(
        &self,
        request: &UpstreamRequest,
        mut budget: RetryBudget,
    ) -> Result<Envelope, UpstreamError> {
        let mut token = self.tokens.current();

        loop {
            match self.upstream.send(request, token.as_ref()).await {
                Err(UpstreamError::Unauthorized) => {
                    budget = match budget.spend() {
                        Some(remaining) => remaining,
                        None => {
                            tracing::warn!(
                                target_path = %request.target(),
                                "Upstream rejected refreshed token, giving up"
                            );
                            return Err(UpstreamError::Unauthorized);
                        }
                    };

                    tracing::info!(
                        target_path = %request.target(),
                        "Upstream rejected access token, refreshing and retrying"
                    );

                    match self.tokens.refresh_stale(token.as_ref()).await {
                        Ok(fresh) => token = Some(fresh),
                        Err(err) => {
                            tracing::error!(error = %err, "Token refresh after 401 failed");
                            return Err(UpstreamError::Unauthorized);
                        }
                    }
                }
                other => return other,
            }
        }
    }
}
