//! Test doubles shared by unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::domain::{AccessToken, Credentials};
use crate::upstream::request::AUTH_PATH;
use crate::upstream::{Envelope, Method, Upstream, UpstreamError, UpstreamRequest};

/// One call observed by [`ScriptedUpstream`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub target: String,
    pub token: Option<String>,
    pub body: Option<Value>,
}

type Scripted = Result<Envelope, UpstreamError>;

/// In-memory upstream answering from per-target scripts.
///
/// Each target has a queue of responses; the last response in a queue is
/// repeated for any further calls.
#[derive(Default)]
pub struct ScriptedUpstream {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response for `target`
    pub fn respond(&self, target: &str, response: Scripted) -> &Self {
        self.scripts
            .lock()
            .entry(target.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a successful envelope carrying `result`
    pub fn respond_ok(&self, target: &str, result: Value) -> &Self {
        self.respond(target, Ok(Envelope::ok(result)))
    }

    /// Queue a successful credential exchange issuing `token`
    pub fn respond_login(&self, token: &str) -> &Self {
        self.respond_ok(
            AUTH_PATH,
            json!({"Token": token, "RefreshToken": format!("{token}-refresh")}),
        )
    }

    /// Delay every response for `target`
    pub fn delay(&self, target: &str, delay: Duration) -> &Self {
        self.delays.lock().insert(target.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, target: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.target == target)
            .cloned()
            .collect()
    }

    pub fn login_count(&self) -> usize {
        self.calls_to(AUTH_PATH).len()
    }

    fn next_response(&self, target: &str) -> Scripted {
        let mut scripts = self.scripts.lock();
        match scripts.get_mut(target) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(UpstreamError::Transport("script exhausted".to_string()))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(UpstreamError::Transport("script exhausted".to_string()))),
            None => Err(UpstreamError::Status {
                status: 404,
                message: format!("no script for {target}"),
            }),
        }
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn send(
        &self,
        request: &UpstreamRequest,
        token: Option<&AccessToken>,
    ) -> Result<Envelope, UpstreamError> {
        let target = request.target();
        self.calls.lock().push(RecordedCall {
            method: request.method(),
            target: target.clone(),
            token: token.map(|token| token.value().to_string()),
            body: request.body().cloned(),
        });

        let delay = self.delays.lock().get(&target).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.next_response(&target)
    }
}

pub fn test_credentials() -> Credentials {
    Credentials::new("gateway", "secret")
}
