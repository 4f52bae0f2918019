//! Shared application state
//!
//! One token manager per process; every route handler shares it through
//! the authorized upstream.

use std::sync::Arc;

use crate::config::Config;
use crate::domain::{AccessToken, Credentials};
use crate::error::AppError;
use crate::handlers::{ListUsersHandler, LookupHandler, TransactionAggregator};
use crate::token::{AuthorizedUpstream, TokenManager};
use crate::upstream::{HttpUpstream, Upstream};

/// State handed to every route handler
#[derive(Clone)]
pub struct AppState {
    upstream: AuthorizedUpstream,
    aggregation_concurrency: usize,
}

impl AppState {
    pub fn new(upstream: Arc<dyn Upstream>, credentials: Credentials) -> Self {
        let tokens = TokenManager::new(Arc::clone(&upstream), credentials);
        Self::from_parts(AuthorizedUpstream::new(upstream, tokens), 0)
    }

    fn from_parts(upstream: AuthorizedUpstream, aggregation_concurrency: usize) -> Self {
        Self {
            upstream,
            aggregation_concurrency,
        }
    }

    /// Build the state for a running server from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::new(
            &config.upstream_base_url,
            config.upstream_timeout,
        )?);

        let mut tokens = TokenManager::new(
            Arc::clone(&upstream),
            config.upstream_credentials.clone(),
        );
        if let Some(token) = &config.upstream_token {
            tokens = tokens.with_initial_token(AccessToken::new(token.clone()));
        }

        Ok(Self::from_parts(
            AuthorizedUpstream::new(upstream, tokens),
            config.aggregation_concurrency,
        ))
    }

    pub fn tokens(&self) -> &TokenManager {
        self.upstream.tokens()
    }

    pub fn aggregator(&self) -> TransactionAggregator {
        TransactionAggregator::new(self.upstream.clone())
            .with_concurrency_limit(self.aggregation_concurrency)
    }

    pub fn users(&self) -> ListUsersHandler {
        ListUsersHandler::new(self.upstream.clone())
    }

    pub fn lookups(&self) -> LookupHandler {
        LookupHandler::new(self.upstream.clone())
    }
}
