//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;
mod state;

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

pub use routes::create_router;
pub use state::AppState;

/// Build the application router
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    // Layers run outermost first: cors -> trace -> set request id ->
    // propagate request id -> request context -> logging -> handler
    let api_router = create_router()
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(axum::middleware::from_fn(
            middleware::request_context_middleware,
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for the browser front-end; any origin when `origin` is `None`
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, AppError> {
    let allow_origin = match origin {
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin).map_err(|_| {
            AppError::Internal(format!("invalid CORS origin: {}", origin))
        })?),
        None => AllowOrigin::from(Any),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
