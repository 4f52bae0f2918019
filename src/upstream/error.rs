//! Upstream Errors
//!
//! Failures talking to the third-party financial-data API.

/// Errors that can occur calling the upstream API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// HTTP 401; the only failure that triggers a token refresh
    #[error("Upstream rejected the access token")]
    Unauthorized,

    /// Any other non-success HTTP status
    #[error("Upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Successful HTTP exchange whose envelope is flagged `isError`
    #[error("Upstream reported an error (status {status_code}): {message}")]
    Envelope { status_code: i64, message: String },

    /// Connection, TLS or timeout failure
    #[error("Upstream transport error: {0}")]
    Transport(String),

    /// Body was not the expected JSON shape
    #[error("Malformed upstream response: {0}")]
    Decode(String),

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    /// Check if this error is an authorization failure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, UpstreamError::Unauthorized)
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}
