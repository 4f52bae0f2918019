//! Request Context
//!
//! Metadata about the browser request currently being served, used for
//! log correlation.

use axum::http::HeaderMap;
use uuid::Uuid;

/// Header carrying the correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Context for a gateway request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation ID for request tracing
    pub correlation_id: Uuid,
}

impl RequestContext {
    /// Create a context with a fresh correlation ID
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Build a context from the `x-request-id` header, generating a new
    /// correlation ID when the header is missing or not a UUID
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let context = Self::new();
        match headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
        {
            Some(correlation_id) => context.with_correlation_id(correlation_id),
            None => context,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
