//! Transaction Aggregation Handler
//!
//! Fans one upstream query out per requested user and merges the results.
//! A failed per-user query becomes a failed entry; it never fails the
//! aggregate.

use std::num::NonZeroUsize;

use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use serde_json::Value;

use crate::domain::{AggregatedResult, TransactionRecord, UserId, UserTransactions};
use crate::error::AppError;
use crate::token::AuthorizedUpstream;
use crate::upstream::{Envelope, UpstreamError, UpstreamRequest};

use super::FetchTransactionsCommand;

/// Handler for multi-user transaction queries
pub struct TransactionAggregator {
    upstream: AuthorizedUpstream,
    concurrency: Option<NonZeroUsize>,
}

impl TransactionAggregator {
    /// Aggregator with unbounded fan-out
    pub fn new(upstream: AuthorizedUpstream) -> Self {
        Self {
            upstream,
            concurrency: None,
        }
    }

    /// Cap the number of in-flight per-user queries; `0` means unbounded
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency = NonZeroUsize::new(limit);
        self
    }

    /// Execute the fetch transactions command
    pub async fn execute(
        &self,
        command: FetchTransactionsCommand,
    ) -> Result<AggregatedResult, AppError> {
        self.fetch_transactions(command.user_ids).await
    }

    /// Fetch transactions for every user in `user_ids`.
    ///
    /// The result has one entry per id, in input order. Fails only when no
    /// valid token can be obtained up front.
    pub async fn fetch_transactions(
        &self,
        user_ids: Vec<UserId>,
    ) -> Result<AggregatedResult, AppError> {
        if user_ids.is_empty() {
            return Ok(AggregatedResult::default());
        }

        self.upstream.tokens().ensure_valid_token().await?;

        let requested = user_ids.len();
        let queries = user_ids
            .into_iter()
            .map(|user_id| self.fetch_for_user(user_id));

        // Both paths yield results in input order
        let entries = match self.concurrency {
            Some(limit) => {
                stream::iter(queries)
                    .buffered(limit.get())
                    .collect::<Vec<_>>()
                    .await
            }
            None => join_all(queries).await,
        };

        let result: AggregatedResult = entries.into_iter().collect();
        let failed = result.entries().iter().filter(|e| e.is_failed()).count();

        tracing::info!(
            requested = requested,
            failed = failed,
            "Aggregated user transactions"
        );

        Ok(result)
    }

    async fn fetch_for_user(&self, user_id: UserId) -> UserTransactions {
        let request = UpstreamRequest::user_transactions(&user_id);

        let outcome = self
            .upstream
            .call(&request)
            .await
            .and_then(Envelope::into_result)
            .and_then(transactions_from_result);

        match outcome {
            Ok(transactions) => UserTransactions::fetched(user_id, transactions),
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "Fetching user transactions failed");
                UserTransactions::failed(user_id, err.to_string())
            }
        }
    }
}

/// Accepts a bare array, `{"transactions": [...]}`, or null (no transactions)
fn transactions_from_result(result: Value) -> Result<Vec<TransactionRecord>, UpstreamError> {
    match result {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(Vec::new()),
        Value::Object(mut fields) => match fields.remove("transactions") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(UpstreamError::Decode(
                "expected an array of transactions".to_string(),
            )),
        },
        _ => Err(UpstreamError::Decode(
            "expected an array of transactions".to_string(),
        )),
    }
}
