//! Common test utilities
//!
//! A mock of the upstream financial-data API served on an ephemeral local
//! port, plus helpers to drive the gateway router against it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use finance_gateway::{
    api,
    domain::Credentials,
    upstream::{HttpUpstream, Upstream},
    AppState,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::util::ServiceExt;

pub const USERNAME: &str = "gateway";
pub const PASSWORD: &str = "secret";

/// Observable state of the mock upstream
#[derive(Default)]
pub struct MockState {
    logins: AtomicUsize,
    valid_token: Mutex<Option<String>>,
    users: Mutex<Vec<Value>>,
    transactions: Mutex<HashMap<String, Vec<Value>>>,
    seen_tokens: Mutex<Vec<Option<String>>>,
}

impl MockState {
    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    /// Invalidate the issued token, as an upstream-side expiry would
    pub fn revoke_token(&self) {
        *self.valid_token.lock() = Some("revoked-elsewhere".to_string());
    }

    pub fn set_users(&self, users: Vec<Value>) {
        *self.users.lock() = users;
    }

    pub fn set_transactions(&self, user_id: &str, transactions: Vec<Value>) {
        self.transactions
            .lock()
            .insert(user_id.to_string(), transactions);
    }

    /// Bearer tokens presented to authenticated endpoints, in order
    pub fn seen_tokens(&self) -> Vec<Option<String>> {
        self.seen_tokens.lock().clone()
    }
}

/// Running mock upstream
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        state.set_users(vec![json!({"userId": "u1"}), json!({"userId": "u2"})]);
        state.set_transactions("u1", vec![json!({"id": "tx-1", "amount": 25.0})]);
        state.set_transactions(
            "u2",
            vec![
                json!({"id": "tx-2", "amount": -4.5}),
                json!({"id": "tx-3", "amount": 10.0}),
            ],
        );

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/users", get(users))
            .route("/transactions", get(transactions))
            .route("/transactions/:id", get(transaction))
            .route("/aggregation/:id", get(aggregation))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Gateway router wired to this mock with the given credentials
    pub fn gateway_with(&self, credentials: Credentials) -> Router {
        let upstream: Arc<dyn Upstream> = Arc::new(
            HttpUpstream::new(&self.base_url(), Some(Duration::from_secs(5))).unwrap(),
        );
        let state = AppState::new(upstream, credentials);
        api::build_router(state, api::cors_layer(None).unwrap())
    }

    pub fn gateway(&self) -> Router {
        self.gateway_with(Credentials::new(USERNAME, PASSWORD))
    }
}

// =========================================================================
// Gateway request helpers
// =========================================================================

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, headers, json)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// =========================================================================
// Mock upstream endpoints
// =========================================================================

fn envelope(result: Value) -> Json<Value> {
    Json(json!({"statusCode": 200, "isError": false, "result": result}))
}

fn error_envelope(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "statusCode": status.as_u16(),
            "isError": true,
            "result": null,
            "message": message
        })),
    )
        .into_response()
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if body["Username"] != USERNAME || body["Password"] != PASSWORD {
        return error_envelope(StatusCode::UNAUTHORIZED, "invalid credentials");
    }

    let n = state.logins.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("token-{}", n);
    *state.valid_token.lock() = Some(token.clone());

    envelope(json!({
        "Token": token,
        "RefreshToken": format!("refresh-{}", n),
        "ExpiresIn": 3600
    }))
    .into_response()
}

/// Rejects the request unless it carries the currently valid bearer token
fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    state.seen_tokens.lock().push(presented.clone());

    match (presented, state.valid_token.lock().clone()) {
        (Some(presented), Some(valid)) if presented == valid => Ok(()),
        _ => Err(error_envelope(StatusCode::UNAUTHORIZED, "token expired")),
    }
}

async fn users(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    envelope(Value::Array(state.users.lock().clone())).into_response()
}

async fn transactions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let user_id = query.get("userId").cloned().unwrap_or_default();
    if user_id == "broken" {
        return error_envelope(StatusCode::INTERNAL_SERVER_ERROR, "ledger unavailable");
    }

    match state.transactions.lock().get(&user_id) {
        Some(records) => envelope(Value::Array(records.clone())).into_response(),
        None => (
            StatusCode::OK,
            Json(json!({
                "statusCode": 404,
                "isError": true,
                "result": null,
                "message": format!("unknown user {}", user_id)
            })),
        )
            .into_response(),
    }
}

async fn transaction(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    envelope(json!({"id": id, "amount": 42.0})).into_response()
}

async fn aggregation(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    envelope(json!({"requestId": id, "status": "complete", "total": 30.5})).into_response()
}
