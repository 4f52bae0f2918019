//! Lookup Handler
//!
//! Single-resource passthrough queries: aggregation request status and
//! individual transactions.

use serde_json::Value;

use crate::error::AppError;
use crate::token::AuthorizedUpstream;
use crate::upstream::UpstreamRequest;

/// Handler for single-resource upstream lookups
pub struct LookupHandler {
    upstream: AuthorizedUpstream,
}

impl LookupHandler {
    pub fn new(upstream: AuthorizedUpstream) -> Self {
        Self { upstream }
    }

    /// Upstream result for an aggregation request
    pub async fn aggregation(&self, request_id: &str) -> Result<Value, AppError> {
        self.fetch(UpstreamRequest::aggregation(request_id)).await
    }

    /// Upstream payload for one transaction
    pub async fn transaction(&self, transaction_id: &str) -> Result<Value, AppError> {
        self.fetch(UpstreamRequest::transaction(transaction_id)).await
    }

    async fn fetch(&self, request: UpstreamRequest) -> Result<Value, AppError> {
        self.upstream.tokens().ensure_valid_token().await?;
        let result = self.upstream.call(&request).await?.into_result()?;
        Ok(result)
    }
}
