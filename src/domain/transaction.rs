//! Transaction aggregation types
//!
//! Per-user outcomes of a fan-out transaction query. Transaction records
//! themselves are owned by the upstream API and passed through untouched.

use std::fmt;

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upstream transaction record, passed through without local validation
pub type TransactionRecord = Value;

/// Opaque upstream user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an identifier from a JSON value.
    ///
    /// Strings are taken as-is and numbers are converted to their decimal
    /// form. Anything else is not an identifier.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(id) => Some(Self(id.clone())),
            Value::Number(id) => Some(Self(id.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Result of one per-user upstream query
#[derive(Debug, Clone, PartialEq)]
pub enum UserOutcome {
    Fetched(Vec<TransactionRecord>),
    Failed(String),
}

/// One entry of an [`AggregatedResult`]
///
/// Serializes as `{"userId", "transactions", "error"?}`: a failed entry
/// carries an empty `transactions` array and an `error` reason.
#[derive(Debug, Clone, PartialEq)]
pub struct UserTransactions {
    pub user_id: UserId,
    pub outcome: UserOutcome,
}

impl UserTransactions {
    pub fn fetched(user_id: UserId, transactions: Vec<TransactionRecord>) -> Self {
        Self {
            user_id,
            outcome: UserOutcome::Fetched(transactions),
        }
    }

    pub fn failed(user_id: UserId, reason: impl Into<String>) -> Self {
        Self {
            user_id,
            outcome: UserOutcome::Failed(reason.into()),
        }
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        match &self.outcome {
            UserOutcome::Fetched(transactions) => transactions.as_slice(),
            UserOutcome::Failed(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            UserOutcome::Fetched(_) => None,
            UserOutcome::Failed(reason) => Some(reason.as_str()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, UserOutcome::Failed(_))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserTransactionsWire<'a> {
    user_id: &'a UserId,
    transactions: &'a [TransactionRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for UserTransactions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        UserTransactionsWire {
            user_id: &self.user_id,
            transactions: self.transactions(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

/// Per-user results in the order the user ids were requested
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregatedResult(Vec<UserTransactions>);

impl AggregatedResult {
    pub fn entries(&self) -> &[UserTransactions] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<UserTransactions> for AggregatedResult {
    fn from_iter<I: IntoIterator<Item = UserTransactions>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
