//! Upstream HTTP client
//!
//! Attaches the bearer credential and decodes the response envelope. No
//! retry or business logic lives here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::domain::AccessToken;

use super::{Envelope, Method, UpstreamError, UpstreamRequest};

/// Transport to the third-party API
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Send `request`, authenticating with `token` when one is given
    async fn send(
        &self,
        request: &UpstreamRequest,
        token: Option<&AccessToken>,
    ) -> Result<Envelope, UpstreamError>;
}

/// reqwest-backed [`Upstream`]
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: Url,
}

impl HttpUpstream {
    /// Create a client rooted at `base_url`.
    ///
    /// `timeout` bounds each whole request; `None` leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, UpstreamError> {
        let base_url =
            Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl(base_url.to_string()));
        }

        let builder = Client::builder();
        let builder = match timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Resolve the request against the base URL, percent-encoding each
    /// path segment and query pair
    pub fn url_for(&self, request: &UpstreamRequest) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(request.segments());

        if !request.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query_pairs());
        }

        Ok(url)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(
        &self,
        request: &UpstreamRequest,
        token: Option<&AccessToken>,
    ) -> Result<Envelope, UpstreamError> {
        let url = self.url_for(request)?;

        tracing::debug!(
            method = %request.method(),
            target = %request.target(),
            authenticated = token.is_some(),
            "Sending upstream request"
        );

        let builder = match request.method() {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        let builder = match request.body() {
            Some(body) => builder.json(body),
            None => builder,
        };
        let builder = match token {
            Some(token) => builder.bearer_auth(token.value()),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(UpstreamError::Unauthorized);
        }

        let bytes = response.bytes().await?;

        if !status.is_success() {
            // Error bodies are usually envelopes too; fall back to the reason phrase
            let message = serde_json::from_slice::<Envelope>(&bytes)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}
