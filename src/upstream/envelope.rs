//! Response envelope
//!
//! Every upstream response is wrapped in
//! `{ statusCode, isError, result, message }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::UpstreamError;

/// Uniform upstream response wrapper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope {
    /// Successful envelope carrying `result`
    pub fn ok(result: Value) -> Self {
        Self {
            status_code: 200,
            is_error: false,
            result,
            message: None,
        }
    }

    /// Envelope flagged as an error
    pub fn error(status_code: i64, message: impl Into<String>) -> Self {
        Self {
            status_code,
            is_error: true,
            result: Value::Null,
            message: Some(message.into()),
        }
    }

    /// Unwrap the payload, turning an `isError` envelope into an error
    pub fn into_result(self) -> Result<Value, UpstreamError> {
        if self.is_error {
            return Err(UpstreamError::Envelope {
                status_code: self.status_code,
                message: self
                    .message
                    .unwrap_or_else(|| "no message provided".to_string()),
            });
        }
        Ok(self.result)
    }
}
