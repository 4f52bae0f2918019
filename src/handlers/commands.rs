//! Command definitions
//!
//! Commands represent validated gateway requests.

use serde_json::Value;

use crate::domain::UserId;
use crate::error::AppError;

// =========================================================================
// FetchTransactionsCommand
// =========================================================================

/// Command to fetch transactions for a set of users
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTransactionsCommand {
    /// Requested users, in response order; duplicates are kept
    pub user_ids: Vec<UserId>,
}

impl FetchTransactionsCommand {
    pub fn new(user_ids: Vec<UserId>) -> Self {
        Self { user_ids }
    }

    /// Validate a browser request body.
    ///
    /// Accepts a bare array of user ids or an object with a `userIds` array.
    /// Each id must be a string or a number.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("Request body is not valid JSON: {}", e)))?;

        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut fields) => match fields.remove("userIds") {
                Some(Value::Array(items)) => items,
                _ => return Err(not_an_array()),
            },
            _ => return Err(not_an_array()),
        };

        let user_ids = items
            .iter()
            .map(|item| {
                UserId::from_json(item).ok_or_else(|| {
                    AppError::Validation("userIds must contain only strings or numbers".to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(user_ids))
    }
}

fn not_an_array() -> AppError {
    AppError::Validation("userIds must be an array".to_string())
}
