//! Authentication Errors
//!
//! Failures of the credential exchange. Cloneable so every caller waiting
//! on a shared refresh receives the same error.

use crate::upstream::UpstreamError;

/// Errors that can occur acquiring an access token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Authorization endpoint answered with a non-success status
    #[error("Credential exchange rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Envelope flagged `isError`
    #[error("Credential exchange reported an error: {0}")]
    Envelope(String),

    /// Success envelope without a usable `Token`
    #[error("Credential exchange returned no token")]
    MissingToken,

    #[error("Credential exchange returned a malformed result: {0}")]
    Malformed(String),

    #[error("Credential exchange failed: {0}")]
    Transport(String),
}

impl From<UpstreamError> for AuthError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unauthorized => AuthError::Rejected {
                status: 401,
                message: "unauthorized".to_string(),
            },
            UpstreamError::Status { status, message } => AuthError::Rejected { status, message },
            UpstreamError::Envelope { message, .. } => AuthError::Envelope(message),
            UpstreamError::Decode(message) => AuthError::Malformed(message),
            UpstreamError::Transport(message) | UpstreamError::InvalidUrl(message) => {
                AuthError::Transport(message)
            }
        }
    }
}
