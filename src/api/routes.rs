//! API Routes
//!
//! HTTP endpoint definitions. Each route is a thin translation from the
//! browser request to a handler call.

use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{AggregatedResult, RequestContext, UserId};
use crate::error::AppResult;
use crate::handlers::FetchTransactionsCommand;

use super::AppState;

// =========================================================================
// Response types
// =========================================================================

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: AggregatedResult,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/users", post(list_users))
        .route("/transactions", post(fetch_transactions))
        .route("/aggregation/:request_id", get(get_aggregation))
        .route("/transaction/:transaction_id", get(get_transaction))
}

// =========================================================================
// POST /users
// =========================================================================

/// List the user ids known to the upstream API
async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserId>>> {
    let user_ids = state.users().execute().await?;
    Ok(Json(user_ids))
}

// =========================================================================
// POST /transactions
// =========================================================================

/// Fetch and merge transactions for a list of users.
///
/// The body is read raw so a malformed list is reported as a validation
/// error rather than axum's default rejection.
async fn fetch_transactions(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    body: Bytes,
) -> AppResult<Json<TransactionsResponse>> {
    let command = FetchTransactionsCommand::from_body(&body)?;

    if let Some(Extension(context)) = context {
        tracing::debug!(
            correlation_id = %context.correlation_id,
            users = command.user_ids.len(),
            "Aggregating transactions"
        );
    }

    let transactions = state.aggregator().execute(command).await?;

    Ok(Json(TransactionsResponse { transactions }))
}

// =========================================================================
// GET /aggregation/:request_id
// =========================================================================

async fn get_aggregation(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> AppResult<Json<Value>> {
    let result = state.lookups().aggregation(&request_id).await?;
    Ok(Json(result))
}

// =========================================================================
// GET /transaction/:transaction_id
// =========================================================================

async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> AppResult<Json<Value>> {
    let result = state.lookups().transaction(&transaction_id).await?;
    Ok(Json(result))
}
