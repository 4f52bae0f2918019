//! Upstream requests
//!
//! Method, path, query and body of one call to the upstream API. A request
//! is immutable once built so it can be resubmitted verbatim after a token
//! refresh.

use std::fmt;

use serde_json::Value;

use crate::domain::{Credentials, UserId};

/// Credential exchange endpoint
pub const AUTH_PATH: &str = "auth/login";
/// User listing endpoint
pub const USERS_PATH: &str = "users";
/// Transactions endpoint (per user via `userId`, or by id)
pub const TRANSACTIONS_PATH: &str = "transactions";
/// Aggregation request status endpoint
pub const AGGREGATION_PATH: &str = "aggregation";

/// HTTP method of an upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// One upstream call
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl UpstreamRequest {
    /// GET request for a `/`-separated path relative to the base URL
    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path, None)
    }

    /// POST request carrying a JSON body
    pub fn post(path: &str, body: Value) -> Self {
        Self::new(Method::Post, path, Some(body))
    }

    fn new(method: Method, path: &str, body: Option<Value>) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body,
        }
    }

    /// Append one raw path segment; it is percent-encoded when sent
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append one query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Unencoded `path?query` form, for logs and test assertions
    pub fn target(&self) -> String {
        let mut target = self.segments.join("/");
        for (index, (key, value)) in self.query.iter().enumerate() {
            target.push(if index == 0 { '?' } else { '&' });
            target.push_str(key);
            target.push('=');
            target.push_str(value);
        }
        target
    }

    // =====================================================================
    // Endpoints
    // =====================================================================

    /// Exchange credentials for an access token
    pub fn login(credentials: &Credentials) -> Self {
        Self::post(AUTH_PATH, credentials.login_body())
    }

    /// List users visible to the gateway account
    pub fn list_users() -> Self {
        Self::get(USERS_PATH)
    }

    /// Transactions belonging to one user
    pub fn user_transactions(user_id: &UserId) -> Self {
        Self::get(TRANSACTIONS_PATH).query("userId", user_id.as_str())
    }

    /// Status/result of an aggregation request
    pub fn aggregation(request_id: &str) -> Self {
        Self::get(AGGREGATION_PATH).segment(request_id)
    }

    /// A single transaction by id
    pub fn transaction(transaction_id: &str) -> Self {
        Self::get(TRANSACTIONS_PATH).segment(transaction_id)
    }
}
