//! User Listing Handler
//!
//! Lists the user ids the upstream API exposes to the gateway account.

use serde_json::Value;

use crate::domain::UserId;
use crate::error::AppError;
use crate::token::AuthorizedUpstream;
use crate::upstream::{UpstreamError, UpstreamRequest};

/// Field names an upstream user object may carry its id under
const USER_ID_FIELDS: &[&str] = &["userId", "UserId", "id", "Id"];

/// Handler for user listing
pub struct ListUsersHandler {
    upstream: AuthorizedUpstream,
}

impl ListUsersHandler {
    pub fn new(upstream: AuthorizedUpstream) -> Self {
        Self { upstream }
    }

    /// Fetch all user ids; an empty listing is `NotFound`
    pub async fn execute(&self) -> Result<Vec<UserId>, AppError> {
        self.upstream.tokens().ensure_valid_token().await?;

        let result = self
            .upstream
            .call(&UpstreamRequest::list_users())
            .await?
            .into_result()?;

        let user_ids = user_ids_from_result(&result)?;
        if user_ids.is_empty() {
            return Err(AppError::NotFound("No users found".to_string()));
        }

        tracing::debug!(count = user_ids.len(), "Listed upstream users");
        Ok(user_ids)
    }
}

/// Extract ids from a user listing.
///
/// Elements may be bare ids or objects carrying one of [`USER_ID_FIELDS`];
/// elements without an id are skipped.
fn user_ids_from_result(result: &Value) -> Result<Vec<UserId>, UpstreamError> {
    let users = match result {
        Value::Array(users) => users,
        Value::Null => return Ok(Vec::new()),
        _ => {
            return Err(UpstreamError::Decode(
                "expected an array of users".to_string(),
            ))
        }
    };

    Ok(users
        .iter()
        .filter_map(|user| match user {
            Value::Object(fields) => USER_ID_FIELDS
                .iter()
                .find_map(|field| fields.get(*field).and_then(UserId::from_json)),
            other => UserId::from_json(other),
        })
        .collect())
}
